mod settings;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;

use clap::Parser;

use agecam_core::annotation::infrastructure::box_annotator::BoxAnnotator;
use agecam_core::detection::infrastructure::http_age_estimator::HttpAgeEstimator;
use agecam_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use agecam_core::pipeline::stream_faces_use_case::StreamFacesUseCase;
use agecam_core::stream::frame_ingest::FrameIngestor;
use agecam_core::stream::frame_source::FrameSource;
use agecam_core::stream::mjpeg::MjpegWriter;
use agecam_core::tracking::infrastructure::create_tracker_factory;

use settings::Settings;

/// Annotates a live webcam stream with tracked faces and estimated ages.
///
/// Reads one data-URI encoded frame per line and writes a
/// multipart/x-mixed-replace MJPEG stream.
#[derive(Parser)]
#[command(name = "agecam")]
struct Cli {
    /// Inference service URL (POST, multipart image).
    #[arg(long)]
    endpoint: Option<String>,

    /// Settings file (JSON). Defaults to the per-user settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame input, one data URI per line ("-" for stdin).
    #[arg(long, default_value = "-")]
    input: String,

    /// MJPEG output ("-" for stdout).
    #[arg(long, default_value = "-")]
    output: String,

    /// Width of frames sent for inference.
    #[arg(long)]
    inference_width: Option<u32>,

    /// Width of frames used for local tracking.
    #[arg(long)]
    tracking_width: Option<u32>,

    /// Width of the emitted frames.
    #[arg(long)]
    display_width: Option<u32>,

    /// Cap the loop at this many frames per second.
    #[arg(long)]
    target_fps: Option<f64>,

    /// Weight of a new age estimate (0.0-1.0).
    #[arg(long)]
    decay_alpha: Option<f64>,

    /// Max center distance for matching faces, in tracking pixels.
    #[arg(long)]
    match_threshold: Option<f64>,

    /// Tracker: template or correlation.
    #[arg(long)]
    tracker: Option<String>,

    /// Fail inference calls that take longer than this.
    #[arg(long)]
    inference_timeout_ms: Option<u64>,

    /// Pass frames through without inference (debugging).
    #[arg(long)]
    skip_inference: bool,

    /// Do not mirror frames horizontally.
    #[arg(long)]
    no_mirror: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    apply_overrides(&mut settings, &cli);
    let config = settings.to_pipeline_config()?;
    config.validate()?;

    let source = Arc::new(FrameSource::new());
    let ingestor = FrameIngestor::new(source.clone());
    let receiver = spawn_receiver(open_input(&cli.input)?, ingestor.clone())?;

    let estimator = HttpAgeEstimator::new(&settings.endpoint, config.inference_timeout)?
        .with_jpeg_quality(config.jpeg_quality);
    log::info!("Sending frames to {}", estimator.endpoint());

    let tracker_factory = create_tracker_factory(config.tracker_algorithm);
    let mut use_case = StreamFacesUseCase::new(
        source,
        Box::new(estimator),
        tracker_factory,
        Box::new(BoxAnnotator::default()),
        Box::new(StdoutPipelineLogger::default()),
        config,
    )?;

    let mut writer = MjpegWriter::new(open_output(&cli.output)?);
    let streamed = use_case
        .parts()
        .try_for_each(|part| writer.write_part(&part));

    ingestor.close();
    log::info!("Stream ended after {} frames", writer.parts_written());
    use_case.finish();

    streamed?;
    if receiver.join().is_err() {
        log::warn!("Receiver thread panicked");
    }
    Ok(())
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(w) = cli.inference_width {
        settings.inference_width = w;
    }
    if let Some(w) = cli.tracking_width {
        settings.tracking_width = w;
    }
    if let Some(w) = cli.display_width {
        settings.display_width = w;
    }
    if cli.target_fps.is_some() {
        settings.target_fps = cli.target_fps;
    }
    if let Some(alpha) = cli.decay_alpha {
        settings.decay_alpha = alpha;
    }
    if let Some(t) = cli.match_threshold {
        settings.match_threshold = t;
    }
    if let Some(tracker) = &cli.tracker {
        settings.tracker = tracker.clone();
    }
    if cli.inference_timeout_ms.is_some() {
        settings.inference_timeout_ms = cli.inference_timeout_ms;
    }
    if cli.skip_inference {
        settings.skip_inference = true;
    }
    if cli.no_mirror {
        settings.mirror = false;
    }
}

fn open_input(path: &str) -> Result<Box<dyn BufRead + Send>, Box<dyn std::error::Error>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|e| format!("Cannot open input {path}: {e}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &str) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
    if path == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path).map_err(|e| format!("Cannot create output {path}: {e}"))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Pushes every non-empty input line into the frame source; closes the
/// source at end of input.
fn spawn_receiver(
    input: Box<dyn BufRead + Send>,
    ingestor: FrameIngestor,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("receiver".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => {
                        if !ingestor.handle(line) {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to read input: {e}");
                        break;
                    }
                }
            }
            ingestor.close();
        })
}
