pub mod age_estimator;
pub mod age_smoother;
pub mod detection;
pub mod detection_matcher;
pub mod inference_error;
pub mod retry_policy;
