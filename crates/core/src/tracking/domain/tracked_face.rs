use crate::shared::bounding_box::BoundingBox;

/// Live per-face state carried across frames.
///
/// The box lives in tracking-resolution pixels. It moves every frame with
/// the tracker; the age only changes when a fresh detection is matched.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFace {
    pub bbox: BoundingBox,
    pub smoothed_age: f64,
    pub frames_since_detection_update: usize,
}

impl TrackedFace {
    /// A face seeded from a detection round, with its already-smoothed age.
    pub fn detected(bbox: BoundingBox, smoothed_age: f64) -> Self {
        Self {
            bbox,
            smoothed_age,
            frames_since_detection_update: 0,
        }
    }

    pub fn age_one_frame(&mut self) {
        self.frames_since_detection_update += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_starts_fresh() {
        let face = TrackedFace::detected(BoundingBox::new(0.0, 0.0, 5.0, 5.0), 27.0);
        assert_eq!(face.smoothed_age, 27.0);
        assert_eq!(face.frames_since_detection_update, 0);
    }

    #[test]
    fn test_age_one_frame_increments() {
        let mut face = TrackedFace::detected(BoundingBox::new(0.0, 0.0, 5.0, 5.0), 27.0);
        face.age_one_frame();
        face.age_one_frame();
        assert_eq!(face.frames_since_detection_update, 2);
    }
}
