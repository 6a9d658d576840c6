use crate::shared::bounding_box::BoundingBox;

/// One face found by the remote model, with its raw age estimate.
///
/// The box is canonical (corners, pixels) in the space of the image that was
/// submitted for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub age: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, age: f64) -> Self {
        Self { bbox, age }
    }
}
