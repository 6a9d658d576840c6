use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use agecam_core::pipeline::pipeline_config::{PipelineConfig, RetryBackoff};
use agecam_core::shared::constants::DEFAULT_INFERENCE_ENDPOINT;
use agecam_core::tracking::domain::box_tracker::TrackerAlgorithm;

/// Persisted options. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub inference_width: u32,
    pub tracking_width: u32,
    pub display_width: u32,
    pub target_fps: Option<f64>,
    pub decay_alpha: f64,
    pub match_threshold: f64,
    pub tracker: String,
    pub jpeg_quality: u8,
    pub mirror: bool,
    pub skip_inference: bool,
    pub inference_timeout_ms: Option<u64>,
    /// Both set enables exponential backoff after failed inference rounds.
    pub retry_base_ms: Option<u64>,
    pub retry_max_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        let config = PipelineConfig::default();
        Self {
            endpoint: DEFAULT_INFERENCE_ENDPOINT.to_string(),
            inference_width: config.inference_width,
            tracking_width: config.tracking_width,
            display_width: config.display_width,
            target_fps: config.target_fps,
            decay_alpha: config.decay_alpha,
            match_threshold: config.match_distance_threshold,
            tracker: config.tracker_algorithm.to_string(),
            jpeg_quality: config.jpeg_quality,
            mirror: config.mirror,
            skip_inference: config.skip_inference,
            inference_timeout_ms: None,
            retry_base_ms: None,
            retry_max_ms: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("agecam").join("settings.json"))
    }

    /// Reads `path`, or the per-user settings file when `path` is `None`.
    ///
    /// A missing per-user file yields defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
                Ok(Self::from_json(&json)?)
            }
            None => match Self::config_path().filter(|p| p.exists()) {
                Some(path) => {
                    log::debug!("Loading settings from {}", path.display());
                    Ok(Self::from_json(&fs::read_to_string(path)?)?)
                }
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_pipeline_config(&self) -> Result<PipelineConfig, Box<dyn Error>> {
        let tracker_algorithm: TrackerAlgorithm = self.tracker.parse()?;
        let retry_backoff = match (self.retry_base_ms, self.retry_max_ms) {
            (Some(base), Some(max)) => RetryBackoff::Exponential {
                base: Duration::from_millis(base),
                max: Duration::from_millis(max),
            },
            (None, None) => RetryBackoff::None,
            _ => return Err("retry_base_ms and retry_max_ms must be set together".into()),
        };

        Ok(PipelineConfig {
            inference_width: self.inference_width,
            tracking_width: self.tracking_width,
            display_width: self.display_width,
            target_fps: self.target_fps,
            decay_alpha: self.decay_alpha,
            match_distance_threshold: self.match_threshold,
            tracker_algorithm,
            jpeg_quality: self.jpeg_quality,
            mirror: self.mirror,
            skip_inference: self.skip_inference,
            inference_timeout: self.inference_timeout_ms.map(Duration::from_millis),
            retry_backoff,
        })
    }
}
