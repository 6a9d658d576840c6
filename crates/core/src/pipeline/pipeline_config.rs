use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::age_smoother::DEFAULT_DECAY_ALPHA;
use crate::detection::domain::retry_policy::{ExponentialBackoff, ImmediateRetry, RetryPolicy};
use crate::shared::constants::{
    DEFAULT_DISPLAY_WIDTH, DEFAULT_INFERENCE_WIDTH, DEFAULT_JPEG_QUALITY, DEFAULT_MATCH_DISTANCE,
    DEFAULT_TRACKING_WIDTH,
};
use crate::tracking::domain::box_tracker::TrackerAlgorithm;

/// How long to hold off resubmitting after failed inference rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RetryBackoff {
    /// Resubmit on the next frame.
    #[default]
    None,
    Exponential { base: Duration, max: Duration },
}

impl RetryBackoff {
    pub fn policy(&self) -> Box<dyn RetryPolicy> {
        match *self {
            RetryBackoff::None => Box::new(ImmediateRetry),
            RetryBackoff::Exponential { base, max } => Box::new(ExponentialBackoff::new(base, max)),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroWidth(&'static str),
    #[error("decay_alpha must be within [0, 1], got {0}")]
    DecayAlpha(f64),
    #[error("match_distance_threshold must be positive, got {0}")]
    MatchThreshold(f64),
    #[error("target_fps must be positive, got {0}")]
    TargetFps(f64),
    #[error("jpeg_quality must be within 1..=100, got {0}")]
    JpegQuality(u8),
    #[error("retry backoff base ({base:?}) exceeds its maximum ({max:?})")]
    Backoff { base: Duration, max: Duration },
}

/// Tunables for one streaming pipeline.
///
/// Widths are target image widths; heights always follow the source aspect
/// ratio. The match threshold is measured in tracking-resolution pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub inference_width: u32,
    pub tracking_width: u32,
    pub display_width: u32,
    /// `None` runs the loop as fast as frames arrive.
    pub target_fps: Option<f64>,
    pub decay_alpha: f64,
    pub match_distance_threshold: f64,
    pub tracker_algorithm: TrackerAlgorithm,
    pub jpeg_quality: u8,
    /// Flip horizontally so a user-facing camera reads like a mirror.
    pub mirror: bool,
    /// Debug pass-through: mirror, resize and re-encode only.
    pub skip_inference: bool,
    pub inference_timeout: Option<Duration>,
    pub retry_backoff: RetryBackoff,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inference_width: DEFAULT_INFERENCE_WIDTH,
            tracking_width: DEFAULT_TRACKING_WIDTH,
            display_width: DEFAULT_DISPLAY_WIDTH,
            target_fps: None,
            decay_alpha: DEFAULT_DECAY_ALPHA,
            match_distance_threshold: DEFAULT_MATCH_DISTANCE,
            tracker_algorithm: TrackerAlgorithm::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            mirror: true,
            skip_inference: false,
            inference_timeout: None,
            retry_backoff: RetryBackoff::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, width) in [
            ("inference_width", self.inference_width),
            ("tracking_width", self.tracking_width),
            ("display_width", self.display_width),
        ] {
            if width == 0 {
                return Err(ConfigError::ZeroWidth(name));
            }
        }
        if !(0.0..=1.0).contains(&self.decay_alpha) {
            return Err(ConfigError::DecayAlpha(self.decay_alpha));
        }
        if self.match_distance_threshold.is_nan() || self.match_distance_threshold <= 0.0 {
            return Err(ConfigError::MatchThreshold(self.match_distance_threshold));
        }
        if let Some(fps) = self.target_fps {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(ConfigError::TargetFps(fps));
            }
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::JpegQuality(self.jpeg_quality));
        }
        if let RetryBackoff::Exponential { base, max } = self.retry_backoff {
            if base > max {
                return Err(ConfigError::Backoff { base, max });
            }
        }
        Ok(())
    }

    /// Loop period for `target_fps`, if set.
    pub fn frame_interval(&self) -> Option<Duration> {
        self.target_fps.map(|fps| Duration::from_secs_f64(1.0 / fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.inference_width, 1024);
        assert_eq!(config.tracking_width, 256);
        assert_eq!(config.display_width, 1024);
        assert_eq!(config.decay_alpha, 0.1);
        assert_eq!(config.match_distance_threshold, 200.0);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.tracker_algorithm, TrackerAlgorithm::Template);
        assert!(config.mirror);
        assert!(!config.skip_inference);
        assert!(config.target_fps.is_none());
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::inference_width(PipelineConfig { inference_width: 0, ..Default::default() }, ConfigError::ZeroWidth("inference_width"))]
    #[case::tracking_width(PipelineConfig { tracking_width: 0, ..Default::default() }, ConfigError::ZeroWidth("tracking_width"))]
    #[case::display_width(PipelineConfig { display_width: 0, ..Default::default() }, ConfigError::ZeroWidth("display_width"))]
    #[case::alpha_high(PipelineConfig { decay_alpha: 1.5, ..Default::default() }, ConfigError::DecayAlpha(1.5))]
    #[case::alpha_negative(PipelineConfig { decay_alpha: -0.1, ..Default::default() }, ConfigError::DecayAlpha(-0.1))]
    #[case::threshold(PipelineConfig { match_distance_threshold: 0.0, ..Default::default() }, ConfigError::MatchThreshold(0.0))]
    #[case::fps(PipelineConfig { target_fps: Some(0.0), ..Default::default() }, ConfigError::TargetFps(0.0))]
    #[case::quality(PipelineConfig { jpeg_quality: 0, ..Default::default() }, ConfigError::JpegQuality(0))]
    fn test_validate_rejects(#[case] config: PipelineConfig, #[case] expected: ConfigError) {
        assert_eq!(config.validate(), Err(expected));
    }

    #[test]
    fn test_validate_rejects_nan_alpha() {
        let config = PipelineConfig {
            decay_alpha: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DecayAlpha(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let config = PipelineConfig {
            retry_backoff: RetryBackoff::Exponential {
                base: Duration::from_secs(5),
                max: Duration::from_secs(1),
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Backoff { .. })));
    }

    #[test]
    fn test_frame_interval() {
        let config = PipelineConfig {
            target_fps: Some(20.0),
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Some(Duration::from_millis(50)));
        assert_eq!(PipelineConfig::default().frame_interval(), None);
    }

    #[test]
    fn test_backoff_policy() {
        assert_eq!(RetryBackoff::None.policy().delay_after(3), Duration::ZERO);
        let backoff = RetryBackoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
        };
        assert_eq!(backoff.policy().delay_after(2), Duration::from_millis(200));
    }
}
