/// Width of the images sent to the remote model.
pub const DEFAULT_INFERENCE_WIDTH: u32 = 1024;

/// Width of the images used for local tracking.
pub const DEFAULT_TRACKING_WIDTH: u32 = 256;

/// Width of the annotated images sent back to the browser.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 1024;

/// Center distance (tracking-resolution pixels) above which boxes never match.
pub const DEFAULT_MATCH_DISTANCE: f64 = 200.0;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Frames after which a box is drawn fully in the "cold" color.
pub const DECAY_TIME_FRAMES: usize = 10;

pub const DEFAULT_INFERENCE_ENDPOINT: &str = "http://localhost:5000/model/predict";
