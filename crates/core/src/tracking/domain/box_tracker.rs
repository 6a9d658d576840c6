use std::fmt;
use std::str::FromStr;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Result of advancing every tracked box by one frame.
///
/// `boxes[i]` is `None` when box `i` lost track; lost boxes are dropped from
/// the tracker, so the next advance only reports the survivors.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackAdvance {
    pub ok: bool,
    pub boxes: Vec<Option<BoundingBox>>,
}

impl TrackAdvance {
    pub fn empty() -> Self {
        Self {
            ok: true,
            boxes: Vec::new(),
        }
    }

    /// Every box was lost (and there was at least one).
    pub fn total_loss(&self) -> bool {
        !self.boxes.is_empty() && self.boxes.iter().all(Option::is_none)
    }
}

/// Local, per-frame visual tracker over a set of boxes.
///
/// Boxes and frames share one coordinate space (tracking resolution).
pub trait BoxTracker: Send {
    fn advance(&mut self, frame: &Frame) -> TrackAdvance;

    /// Number of boxes still being tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds a tracker seeded on `frame` with one instance per box.
pub trait BoxTrackerFactory: Send {
    fn create(&self, frame: &Frame, boxes: &[BoundingBox]) -> Box<dyn BoxTracker>;
}

/// Tracking algorithm choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TrackerAlgorithm {
    /// Sum-of-absolute-differences template search. Fastest.
    #[default]
    Template,
    /// Normalised cross-correlation template search. Tolerates lighting changes.
    Correlation,
}

impl fmt::Display for TrackerAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerAlgorithm::Template => write!(f, "template"),
            TrackerAlgorithm::Correlation => write!(f, "correlation"),
        }
    }
}

impl FromStr for TrackerAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "template" | "sad" => Ok(TrackerAlgorithm::Template),
            "correlation" | "ncc" => Ok(TrackerAlgorithm::Correlation),
            other => Err(format!(
                "tracker must be 'template' or 'correlation', got '{other}'"
            )),
        }
    }
}
