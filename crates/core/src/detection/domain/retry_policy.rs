use std::time::Duration;

/// Decides how long to wait before resubmitting after failed inference rounds.
///
/// The single in-flight request already throttles the remote service, so the
/// default policy retries on the very next frame. Hardened deployments can
/// plug in [`ExponentialBackoff`] or their own policy.
pub trait RetryPolicy: Send {
    /// Delay after `consecutive_failures` (>= 1) failed rounds in a row.
    fn delay_after(&self, consecutive_failures: u32) -> Duration;
}

/// Retries on the next eligible frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateRetry;

impl RetryPolicy for ImmediateRetry {
    fn delay_after(&self, _consecutive_failures: u32) -> Duration {
        Duration::ZERO
    }
}

/// Doubles the delay after each consecutive failure, capped at `max`.
#[derive(Clone, Copy, Debug)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay_after(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }
        let exponent = (consecutive_failures - 1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }
}
