/// Default weight of a fresh age estimate against the smoothed history.
pub const DEFAULT_DECAY_ALPHA: f64 = 0.1;

/// Exponentially-decayed age estimate per matched face.
///
/// Formula: `smoothed = alpha * raw + (1 - alpha) * previous`
/// `alpha = 0` ignores new evidence, `alpha = 1` ignores history.
#[derive(Clone, Copy, Debug)]
pub struct AgeSmoother {
    alpha: f64,
}

impl AgeSmoother {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn smooth(&self, previous: f64, raw: f64) -> f64 {
        self.alpha * raw + (1.0 - self.alpha) * previous
    }

    /// Smoothed ages for a new detection round.
    ///
    /// `matches` pairs indices into `previous` with indices into `raw`.
    /// Unmatched new detections start from their raw estimate.
    pub fn apply(&self, previous: &[f64], raw: &[f64], matches: &[(usize, usize)]) -> Vec<f64> {
        let mut ages = raw.to_vec();
        for &(old_ix, new_ix) in matches {
            if let (Some(&prev), Some(&current)) = (previous.get(old_ix), raw.get(new_ix)) {
                ages[new_ix] = self.smooth(prev, current);
            }
        }
        ages
    }
}

impl Default for AgeSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_ALPHA)
    }
}

/// Age as drawn on a label: truncated toward zero.
pub fn age_label(age: f64) -> String {
    format!("{}", age.trunc() as i64)
}
