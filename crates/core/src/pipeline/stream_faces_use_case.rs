use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::annotation::domain::box_color::box_color;
use crate::annotation::domain::frame_annotator::{FaceLabel, FrameAnnotator};
use crate::detection::domain::age_estimator::AgeEstimator;
use crate::detection::domain::age_smoother::{age_label, AgeSmoother};
use crate::detection::domain::detection_matcher::DetectionMatcher;
use crate::detection::domain::inference_error::SubmitError;
use crate::detection::domain::retry_policy::RetryPolicy;
use crate::detection::infrastructure::inference_client::{
    InferenceClient, InferenceHandle, InferencePoll,
};
use crate::shared::frame::Frame;
use crate::stream::frame_ingest::{decode_payload, FramePayload};
use crate::stream::frame_source::FrameSource;
use crate::stream::mjpeg::encode_part;
use crate::tracking::domain::box_tracker::{BoxTracker, BoxTrackerFactory};
use crate::tracking::domain::tracked_face::TrackedFace;

use super::face_reconciler::FaceReconciler;
use super::pipeline_config::{ConfigError, PipelineConfig};
use super::pipeline_logger::PipelineLogger;

/// The request currently with the inference worker.
struct PendingInference {
    handle: InferenceHandle,
    /// Tracking-resolution copy of the submitted frame.
    seed: Frame,
    /// Width of the image the model actually saw.
    inference_width: u32,
}

/// Turns incoming browser frames into an annotated MJPEG stream.
///
/// Every pulled frame is emitted. Remote inference runs beside the loop,
/// one request at a time; while it is out, a local tracker carries the last
/// known faces forward and the frames seen since submission are buffered so
/// the eventual result can be replayed up to the present.
///
/// Per frame: decode, preprocess (mirror and resize to the inference,
/// tracking and display widths), reconcile a finished result, submit if idle,
/// advance the tracker, annotate, encode.
pub struct StreamFacesUseCase {
    source: Arc<FrameSource<FramePayload>>,
    client: Option<InferenceClient>,
    tracker_factory: Box<dyn BoxTrackerFactory>,
    annotator: Box<dyn FrameAnnotator>,
    reconciler: FaceReconciler,
    retry_policy: Box<dyn RetryPolicy>,
    logger: Box<dyn PipelineLogger>,
    config: PipelineConfig,
    faces: Vec<TrackedFace>,
    tracker: Option<Box<dyn BoxTracker>>,
    pending: Option<PendingInference>,
    replay: Vec<Frame>,
    consecutive_failures: u32,
    retry_at: Option<Instant>,
    frames_received: usize,
    frames_emitted: usize,
}

impl StreamFacesUseCase {
    pub fn new(
        source: Arc<FrameSource<FramePayload>>,
        estimator: Box<dyn AgeEstimator>,
        tracker_factory: Box<dyn BoxTrackerFactory>,
        annotator: Box<dyn FrameAnnotator>,
        mut logger: Box<dyn PipelineLogger>,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = if config.skip_inference {
            logger.info("Inference disabled, passing frames through");
            None
        } else {
            Some(InferenceClient::spawn(estimator))
        };
        let reconciler = FaceReconciler::new(
            DetectionMatcher::new(config.match_distance_threshold),
            AgeSmoother::new(config.decay_alpha),
        );

        Ok(Self {
            source,
            client,
            tracker_factory,
            annotator,
            reconciler,
            retry_policy: config.retry_backoff.policy(),
            logger,
            config,
            faces: Vec::new(),
            tracker: None,
            pending: None,
            replay: Vec::new(),
            consecutive_failures: 0,
            retry_at: None,
            frames_received: 0,
            frames_emitted: 0,
        })
    }

    /// Blocks for the next frame and returns its multipart part.
    ///
    /// Malformed payloads are logged and skipped. Returns `None` once the
    /// source is closed and drained.
    pub fn next_part(&mut self) -> Option<Vec<u8>> {
        loop {
            let payload = self.source.pull()?;
            let started = Instant::now();
            let part = self.process_payload(&payload);
            self.regulate(started);
            if part.is_some() {
                return part;
            }
        }
    }

    /// Endless (until the source closes) sequence of multipart parts.
    pub fn parts(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        std::iter::from_fn(move || self.next_part())
    }

    /// Runs one payload through the whole pipeline.
    ///
    /// Returns `None` if the payload was skipped.
    pub fn process_payload(&mut self, payload: &FramePayload) -> Option<Vec<u8>> {
        let index = self.frames_received;
        self.frames_received += 1;

        let t = Instant::now();
        let frame = match decode_payload(payload, index) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Skipping frame {index}: {e}");
                return None;
            }
        };
        self.logger.timing("decode", elapsed_ms(t));

        self.process_frame(&frame)
    }

    pub fn faces(&self) -> &[TrackedFace] {
        &self.faces
    }

    /// Whether a live tracker is following the current faces. `false` after
    /// a total loss, until the next detection round.
    pub fn is_tracking(&self) -> bool {
        self.tracker.is_some()
    }

    pub fn is_inference_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn replay_depth(&self) -> usize {
        self.replay.len()
    }

    pub fn frames_emitted(&self) -> usize {
        self.frames_emitted
    }

    /// Prints the summary and waits for any outstanding inference call.
    pub fn finish(mut self) {
        self.logger.summary();
        if let Some(client) = self.client.take() {
            client.shutdown();
        }
    }

    fn process_frame(&mut self, frame: &Frame) -> Option<Vec<u8>> {
        let t = Instant::now();
        let source = if self.config.mirror {
            frame.mirrored()
        } else {
            frame.clone()
        };
        let mut display = source.resized_to_width(self.config.display_width);
        if self.config.skip_inference {
            self.logger.timing("preprocess", elapsed_ms(t));
            return self.emit(display);
        }
        let inference = source.resized_to_width(self.config.inference_width);
        let tracking = source.resized_to_width(self.config.tracking_width);
        self.logger.timing("preprocess", elapsed_ms(t));

        let t = Instant::now();
        let reconciled = self.reconcile_if_ready();
        if reconciled {
            self.logger.timing("reconcile", elapsed_ms(t));
        }

        self.submit_or_buffer(inference, &tracking);

        let t = Instant::now();
        self.advance_tracker(&tracking, reconciled);
        self.logger.timing("track", elapsed_ms(t));
        self.logger.metric("faces", self.faces.len() as f64);

        let t = Instant::now();
        self.annotate(&mut display, tracking.width());
        self.logger.timing("annotate", elapsed_ms(t));

        self.emit(display)
    }

    /// Merges a finished detection round into the face set.
    ///
    /// Returns `true` only when detections were applied this frame.
    fn reconcile_if_ready(&mut self) -> bool {
        let poll = match &self.pending {
            Some(pending) => pending.handle.poll(),
            None => return false,
        };

        match poll {
            InferencePoll::Pending => false,
            InferencePoll::Failed(e) => {
                self.pending = None;
                self.consecutive_failures += 1;
                let delay = self.retry_policy.delay_after(self.consecutive_failures);
                self.retry_at = (!delay.is_zero()).then(|| Instant::now() + delay);
                log::warn!(
                    "Inference failed ({} in a row), retrying in {delay:?}: {e}",
                    self.consecutive_failures
                );
                false
            }
            InferencePoll::Ready(detections) => {
                let Some(pending) = self.pending.take() else {
                    return false;
                };
                self.consecutive_failures = 0;
                self.retry_at = None;
                self.logger.metric(
                    "inference_latency_ms",
                    pending.handle.elapsed().as_secs_f64() * 1000.0,
                );
                self.logger.metric("replay_depth", self.replay.len() as f64);

                let result = self.reconciler.reconcile(
                    &self.faces,
                    &detections,
                    pending.inference_width,
                    &pending.seed,
                    &self.replay,
                    self.tracker_factory.as_ref(),
                );
                self.logger.metric("matches", result.matched as f64);
                self.logger
                    .metric("lost_in_replay", result.lost_in_replay as f64);
                self.faces = result.faces;
                self.tracker = Some(result.tracker);
                self.replay.clear();
                true
            }
        }
    }

    /// Submits the inference frame if the worker is idle, otherwise keeps the
    /// tracking frame for the next replay.
    fn submit_or_buffer(&mut self, inference: Frame, tracking: &Frame) {
        if self.pending.is_some() {
            self.replay.push(tracking.clone());
            return;
        }
        if self.retry_at.is_some_and(|at| Instant::now() < at) {
            return;
        }
        let Some(client) = self.client.as_ref() else {
            return;
        };

        let inference_width = inference.width();
        match client.submit(inference) {
            Ok(handle) => {
                self.pending = Some(PendingInference {
                    handle,
                    seed: tracking.clone(),
                    inference_width,
                });
                self.replay.clear();
            }
            Err(SubmitError::InFlight) => {
                log::debug!("Inference worker busy, submission rejected");
            }
            Err(SubmitError::WorkerStopped) => {
                log::warn!("Inference worker stopped, streaming without detections");
                self.client = None;
            }
        }
    }

    fn advance_tracker(&mut self, tracking: &Frame, reconciled: bool) {
        if let Some(tracker) = self.tracker.as_mut() {
            let advance = tracker.advance(tracking);
            if advance.total_loss() {
                // Stale faces stay on screen until the next detection round.
                log::warn!(
                    "Lost track of all {} faces, waiting for the next detection",
                    self.faces.len()
                );
                self.tracker = None;
            } else {
                let faces = std::mem::take(&mut self.faces);
                self.faces = faces
                    .into_iter()
                    .zip(advance.boxes)
                    .filter_map(|(mut face, moved)| {
                        face.bbox = moved?;
                        Some(face)
                    })
                    .collect();
            }
        }

        if !reconciled {
            for face in &mut self.faces {
                face.age_one_frame();
            }
        }
    }

    fn annotate(&mut self, display: &mut Frame, tracking_width: u32) {
        if self.faces.is_empty() {
            return;
        }
        let display_width = display.width();
        let labels: Vec<FaceLabel> = self
            .faces
            .iter()
            .map(|face| FaceLabel {
                bbox: face.bbox.scaled(tracking_width, display_width),
                text: age_label(face.smoothed_age),
                color: box_color(face.frames_since_detection_update),
            })
            .collect();
        if let Err(e) = self.annotator.annotate(display, &labels) {
            log::warn!("Failed to annotate frame {}: {e}", display.index());
        }
    }

    fn emit(&mut self, display: Frame) -> Option<Vec<u8>> {
        let t = Instant::now();
        match encode_part(&display, self.config.jpeg_quality) {
            Ok(part) => {
                self.logger.timing("encode", elapsed_ms(t));
                self.frames_emitted += 1;
                self.logger.progress(self.frames_emitted);
                Some(part)
            }
            Err(e) => {
                log::warn!("Failed to encode frame {}: {e}", display.index());
                None
            }
        }
    }

    /// Sleeps off whatever is left of the target frame interval.
    fn regulate(&self, started: Instant) {
        if let Some(interval) = self.config.frame_interval() {
            let spent = started.elapsed();
            if spent < interval {
                thread::sleep(interval - spent);
            }
        }
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
