//! Inbound frame payloads as sent by the browser client.
//!
//! Each payload is a data URI (`data:image/jpeg;base64,<...>`). The
//! receiver only pushes raw payloads; decoding happens on the pipeline
//! thread so the receiver never does heavy work.
use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use super::frame_source::FrameSource;
use crate::shared::frame::Frame;
use crate::shared::image_codec::decode_image;

/// One raw frame message, stamped on arrival.
#[derive(Clone, Debug)]
pub struct FramePayload {
    pub data: String,
    pub received_at: Instant,
}

impl FramePayload {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            received_at: Instant::now(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("empty frame payload")]
    Empty,
    #[error("frame payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("frame payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decodes a data-URI payload into a frame tagged with its arrival time.
///
/// Everything up to and including the `base64,` marker is stripped; a bare
/// base64 string is accepted too.
pub fn decode_payload(payload: &FramePayload, index: usize) -> Result<Frame, PayloadError> {
    let encoded = match payload.data.rfind("base64") {
        Some(pos) => &payload.data[pos + "base64".len()..],
        None => payload.data.as_str(),
    };
    let encoded = encoded.trim_start_matches(',').trim();
    if encoded.is_empty() {
        return Err(PayloadError::Empty);
    }

    let bytes = STANDARD.decode(encoded)?;
    Ok(decode_image(&bytes, index, payload.received_at)?)
}

/// Transport-side handle: pushes every received payload into the source.
#[derive(Clone)]
pub struct FrameIngestor {
    source: Arc<FrameSource<FramePayload>>,
}

impl FrameIngestor {
    pub fn new(source: Arc<FrameSource<FramePayload>>) -> Self {
        Self { source }
    }

    /// Never blocks. Returns `false` once the source has been closed.
    pub fn handle(&self, data: impl Into<String>) -> bool {
        self.source.push(FramePayload::new(data))
    }

    pub fn close(&self) {
        self.source.close();
    }
}
