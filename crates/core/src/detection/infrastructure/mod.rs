pub mod http_age_estimator;
pub mod inference_client;
