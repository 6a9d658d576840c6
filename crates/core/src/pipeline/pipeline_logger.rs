use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for streaming-loop events.
///
/// Keeps the orchestrator free of output concerns: the binary reports to the
/// terminal, tests discard everything.
pub trait PipelineLogger: Send {
    /// Called once per emitted frame with the running total.
    fn progress(&mut self, frames_emitted: usize);

    /// Duration of one named stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time sample (face count, replay depth, latency).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-stream report. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _frames_emitted: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Count, sum and peak of a series. Constant size, so an endless stream
/// never grows it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStat {
    pub count: usize,
    pub total: f64,
    pub max: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = if self.count == 1 { value } else { self.max.max(value) };
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Terminal logger: per-stage timings, metric averages and throughput.
///
/// Every `throttle_frames` emitted frames a progress line with the frame
/// rate over that window goes to `log::info!`.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    stages: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    started: Instant,
    window_started: Instant,
    frames_emitted: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        let now = Instant::now();
        Self {
            throttle_frames: throttle_frames.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: now,
            window_started: now,
            frames_emitted: 0,
        }
    }

    /// Multi-line report, or `None` before anything was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut out = format!(
            "Stream summary ({} frames, {elapsed_s:.1}s):",
            self.frames_emitted
        );
        for (stage, stat) in &self.stages {
            let share = if elapsed_s > 0.0 {
                stat.total / (elapsed_s * 10.0)
            } else {
                0.0
            };
            out.push_str(&format!(
                "\n  {stage:10} avg {:6.1}ms  max {:6.1}ms  ({share:4.1}% of wall time)",
                stat.mean(),
                stat.max
            ));
        }
        for (name, stat) in &self.metrics {
            out.push_str(&format!("\n  {name}: avg {:.1}, max {:.1}", stat.mean(), stat.max));
        }
        if self.frames_emitted > 0 && elapsed_s > 0.0 {
            out.push_str(&format!(
                "\n  Throughput: {:.1} fps",
                self.frames_emitted as f64 / elapsed_s
            ));
        }
        Some(out)
    }

    pub fn stage(&self, stage: &str) -> Option<RunningStat> {
        self.stages.get(stage).copied()
    }

    pub fn metric_stat(&self, name: &str) -> Option<RunningStat> {
        self.metrics.get(name).copied()
    }

    pub fn frames_emitted(&self) -> usize {
        self.frames_emitted
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, frames_emitted: usize) {
        self.frames_emitted = frames_emitted;
        if frames_emitted == 0 || frames_emitted % self.throttle_frames != 0 {
            return;
        }
        let window_s = self.window_started.elapsed().as_secs_f64();
        let fps = if window_s > 0.0 {
            self.throttle_frames as f64 / window_s
        } else {
            0.0
        };
        log::info!("Streamed {frames_emitted} frames ({fps:.1} fps)");
        self.window_started = Instant::now();
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1);
        logger.timing("track", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_running_stat() {
        let mut stat = RunningStat::default();
        assert_eq!(stat.mean(), 0.0);
        for v in [4.0, 10.0, 1.0] {
            stat.record(v);
        }
        assert_eq!(stat.count, 3);
        assert_relative_eq!(stat.mean(), 5.0);
        assert_relative_eq!(stat.max, 10.0);
    }

    #[test]
    fn test_timings_aggregate_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("track", 20.0);
        logger.timing("track", 30.0);
        logger.timing("encode", 5.0);

        let track = logger.stage("track").unwrap();
        assert_eq!(track.count, 2);
        assert_relative_eq!(track.mean(), 25.0);
        assert_eq!(logger.stage("encode").unwrap().count, 1);
        assert!(logger.stage("decode").is_none());
    }

    #[test]
    fn test_metrics_aggregate() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("replay_depth", 3.0);
        logger.metric("replay_depth", 4.0);
        assert_relative_eq!(logger.metric_stat("replay_depth").unwrap().mean(), 3.5);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(10);
        logger.timing("annotate", 2.0);
        logger.timing("reconcile", 8.0);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Stream summary (10 frames"));
        assert!(summary.contains("annotate"));
        assert!(summary.contains("reconcile"));
        assert!(summary.contains("faces: avg 1.5, max 2.0"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_emitted_frames() {
        let mut logger = StdoutPipelineLogger::new(5);
        for i in 1..=12 {
            logger.progress(i);
        }
        assert_eq!(logger.frames_emitted(), 12);
    }

    #[test]
    fn test_throttle_is_at_least_one() {
        assert_eq!(StdoutPipelineLogger::new(0).throttle_frames, 1);
        assert_eq!(StdoutPipelineLogger::default().throttle_frames, 30);
    }
}
