use thiserror::Error;

/// Why a remote inference round produced no detections.
///
/// None of these are fatal to the stream: the orchestrator logs them and
/// submits again on a later frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("failed to encode frame for inference: {0}")]
    Encode(String),
    #[error("inference request failed: {0}")]
    Network(String),
    #[error("inference request timed out")]
    Timeout,
    #[error("inference service returned HTTP {0}")]
    Status(u16),
    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
    #[error("inference worker stopped")]
    WorkerStopped,
}

/// Why a submission was refused. The request is never queued.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("an inference request is already in flight")]
    InFlight,
    #[error("inference worker stopped")]
    WorkerStopped,
}
