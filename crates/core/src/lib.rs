//! Live webcam pipeline: remote face/age inference reconciled with local
//! tracking, emitted as an annotated MJPEG stream.
pub mod annotation;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod stream;
pub mod tracking;
