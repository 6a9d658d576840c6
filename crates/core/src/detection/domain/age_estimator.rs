use crate::detection::domain::detection::Detection;
use crate::detection::domain::inference_error::InferenceError;
use crate::shared::frame::Frame;

/// Domain interface for the remote face-and-age model.
///
/// Implementations block for the duration of the call; the inference client
/// runs them on its own worker thread. Returned boxes are canonical corner
/// boxes in the pixel space of `frame`.
pub trait AgeEstimator: Send {
    fn estimate(&self, frame: &Frame) -> Result<Vec<Detection>, InferenceError>;
}
