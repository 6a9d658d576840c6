//! Remote face + age model reached over HTTP.
//!
//! Request: `POST <endpoint>` with a multipart form holding one JPEG part
//! named `image`. Response: `{"predictions": [{"detection_box" | "face_box":
//! [...], "age_estimation": n}, ...]}`.
//!
//! Two box conventions come back from deployed models and both are
//! normalised here, before anything reaches the pipeline:
//! - `detection_box`: `[y1, x1, y2, x2]` normalised to `[0, 1]`
//! - `face_box`: `[x1, y1, w, h]` in pixels
//!
//! Results are canonical corner boxes in the pixel space of the submitted
//! frame.
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::detection::domain::age_estimator::AgeEstimator;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::inference_error::InferenceError;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::shared::frame::Frame;
use crate::shared::image_codec::encode_jpeg;

#[derive(Deserialize, Debug)]
struct PredictResponse {
    predictions: Vec<Prediction>,
}

#[derive(Deserialize, Debug)]
struct Prediction {
    #[serde(default)]
    detection_box: Option<Vec<f64>>,
    #[serde(default)]
    face_box: Option<Vec<f64>>,
    age_estimation: f64,
}

pub struct HttpAgeEstimator {
    client: reqwest::blocking::Client,
    endpoint: String,
    jpeg_quality: u8,
}

impl HttpAgeEstimator {
    /// `timeout: None` lets a call run for as long as the service takes.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        })
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AgeEstimator for HttpAgeEstimator {
    fn estimate(&self, frame: &Frame) -> Result<Vec<Detection>, InferenceError> {
        let jpeg = encode_jpeg(frame, self.jpeg_quality)
            .map_err(|e| InferenceError::Encode(e.to_string()))?;

        let part = Part::bytes(jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(map_reqwest_error)?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        let body = response.text().map_err(map_reqwest_error)?;
        parse_predictions(&body, frame.width(), frame.height())
    }
}

/// Parses a prediction body into canonical detections.
///
/// `image_width`/`image_height` are the dimensions of the submitted image;
/// they resolve normalised `detection_box` coordinates to pixels.
pub fn parse_predictions(
    body: &str,
    image_width: u32,
    image_height: u32,
) -> Result<Vec<Detection>, InferenceError> {
    let response: PredictResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

    response
        .predictions
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let bbox = if let Some(coords) = p.detection_box {
                BoundingBox::from_normalized_yxyx(
                    four(&coords, i, "detection_box")?,
                    image_width,
                    image_height,
                )
            } else if let Some(coords) = p.face_box {
                let [x, y, w, h] = four(&coords, i, "face_box")?;
                BoundingBox::from_origin_size(x, y, w, h)
            } else {
                return Err(InferenceError::MalformedResponse(format!(
                    "prediction {i} has neither detection_box nor face_box"
                )));
            };
            Ok(Detection::new(bbox, p.age_estimation))
        })
        .collect()
}

fn four(coords: &[f64], index: usize, field: &str) -> Result<[f64; 4], InferenceError> {
    <[f64; 4]>::try_from(coords).map_err(|_| {
        InferenceError::MalformedResponse(format!(
            "prediction {index}: {field} has {} values, expected 4",
            coords.len()
        ))
    })
}

fn map_reqwest_error(e: reqwest::Error) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout
    } else if let Some(status) = e.status() {
        InferenceError::Status(status.as_u16())
    } else {
        InferenceError::Network(e.to_string())
    }
}
