use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::detection::domain::age_estimator::AgeEstimator;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::inference_error::{InferenceError, SubmitError};
use crate::shared::frame::Frame;

type InferenceResult = Result<Vec<Detection>, InferenceError>;

struct Job {
    frame: Frame,
    reply: Sender<InferenceResult>,
}

/// Outcome of a non-blocking check on an outstanding request.
#[derive(Debug)]
pub enum InferencePoll {
    Pending,
    Ready(Vec<Detection>),
    Failed(InferenceError),
}

/// One outstanding inference request.
pub struct InferenceHandle {
    reply: Receiver<InferenceResult>,
    submitted_at: Instant,
}

impl InferenceHandle {
    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    /// Never blocks. `Ready`/`Failed` are reported once; the handle is spent
    /// afterwards and keeps reporting `Failed(WorkerStopped)`.
    pub fn poll(&self) -> InferencePoll {
        match self.reply.try_recv() {
            Ok(Ok(detections)) => InferencePoll::Ready(detections),
            Ok(Err(e)) => InferencePoll::Failed(e),
            Err(TryRecvError::Empty) => InferencePoll::Pending,
            Err(TryRecvError::Disconnected) => InferencePoll::Failed(InferenceError::WorkerStopped),
        }
    }
}

/// Runs remote inference on one dedicated background thread.
///
/// At most one request is in flight. A `submit` while busy is refused with
/// [`SubmitError::InFlight`] instead of being queued; completion is observed
/// through [`InferenceHandle::poll`], never by blocking.
pub struct InferenceClient {
    jobs: Option<Sender<Job>>,
    in_flight: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

/// Clears the in-flight flag even if the estimator panics.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl InferenceClient {
    pub fn spawn(estimator: Box<dyn AgeEstimator>) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(1);
        let in_flight = Arc::new(AtomicBool::new(false));
        let flag = in_flight.clone();

        let worker = thread::Builder::new()
            .name("inference".to_string())
            .spawn(move || {
                for job in job_rx {
                    let guard = InFlightGuard(flag.clone());
                    let result = estimator.estimate(&job.frame);
                    drop(guard);
                    // The orchestrator may have dropped the handle; that is fine.
                    let _ = job.reply.send(result);
                }
            })
            .ok();

        if worker.is_none() {
            log::error!("Failed to spawn inference worker thread");
        }

        Self {
            jobs: worker.as_ref().map(|_| job_tx),
            in_flight,
            worker,
        }
    }

    pub fn submit(&self, frame: Frame) -> Result<InferenceHandle, SubmitError> {
        let jobs = self.jobs.as_ref().ok_or(SubmitError::WorkerStopped)?;
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::InFlight);
        }

        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let job = Job {
            frame,
            reply: reply_tx,
        };
        if jobs.try_send(job).is_err() {
            self.in_flight.store(false, Ordering::Release);
            return Err(SubmitError::WorkerStopped);
        }

        Ok(InferenceHandle {
            reply: reply_rx,
            submitted_at: Instant::now(),
        })
    }

    /// Stops accepting work and waits for the current call to finish.
    pub fn shutdown(mut self) {
        self.jobs = None;
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::warn!("Inference worker panicked");
            }
        }
    }
}

impl Drop for InferenceClient {
    fn drop(&mut self) {
        // Closing the job channel lets the worker exit after its current call.
        self.jobs = None;
    }
}
