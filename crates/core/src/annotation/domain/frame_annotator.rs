use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// One box to draw, already in display-resolution pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLabel {
    pub bbox: BoundingBox,
    pub text: String,
    /// RGB, 0-255 per channel.
    pub color: [f64; 3],
}

/// Draws face boxes and their labels onto a frame in place.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        labels: &[FaceLabel],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
