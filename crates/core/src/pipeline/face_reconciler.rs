use crate::detection::domain::age_smoother::AgeSmoother;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::detection_matcher::DetectionMatcher;
use crate::shared::bounding_box::{scale_boxes, BoundingBox};
use crate::shared::frame::Frame;
use crate::tracking::domain::box_tracker::{BoxTracker, BoxTrackerFactory};
use crate::tracking::domain::tracked_face::TrackedFace;

/// New face state after merging a finished detection round.
pub struct Reconciliation {
    /// Faces aligned index-for-index with `tracker`.
    pub faces: Vec<TrackedFace>,
    pub tracker: Box<dyn BoxTracker>,
    pub matched: usize,
    /// Detections whose track was lost while catching up.
    pub lost_in_replay: usize,
}

/// Merges detections computed on an old frame into the live face set.
///
/// Detections describe the frame that was submitted, which by now is several
/// frames old. A fresh tracker is seeded on that frame and replayed through
/// every frame seen since, so the boxes describe the present before they are
/// matched against the faces currently on screen.
pub struct FaceReconciler {
    matcher: DetectionMatcher,
    smoother: AgeSmoother,
}

impl FaceReconciler {
    pub fn new(matcher: DetectionMatcher, smoother: AgeSmoother) -> Self {
        Self { matcher, smoother }
    }

    /// `detections` are in the pixel space of an image `inference_width`
    /// wide; `seed` and `replay` are tracking-resolution frames, oldest first.
    pub fn reconcile(
        &self,
        previous: &[TrackedFace],
        detections: &[Detection],
        inference_width: u32,
        seed: &Frame,
        replay: &[Frame],
        factory: &dyn BoxTrackerFactory,
    ) -> Reconciliation {
        let boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
        let seeded = scale_boxes(&boxes, inference_width, seed.width());

        let mut tracker = factory.create(seed, &seeded);
        // (detection index, current box) for every detection still tracked.
        let mut alive: Vec<(usize, BoundingBox)> = seeded.into_iter().enumerate().collect();
        for frame in replay {
            if alive.is_empty() {
                break;
            }
            let advance = tracker.advance(frame);
            alive = alive
                .into_iter()
                .zip(advance.boxes)
                .filter_map(|((ix, _), moved)| moved.map(|b| (ix, b)))
                .collect();
        }
        let lost_in_replay = detections.len() - alive.len();

        let old_boxes: Vec<BoundingBox> = previous.iter().map(|f| f.bbox).collect();
        let new_boxes: Vec<BoundingBox> = alive.iter().map(|&(_, b)| b).collect();
        let matches = self.matcher.match_boxes(&old_boxes, &new_boxes);

        let previous_ages: Vec<f64> = previous.iter().map(|f| f.smoothed_age).collect();
        let raw_ages: Vec<f64> = alive.iter().map(|&(ix, _)| detections[ix].age).collect();
        let ages = self.smoother.apply(&previous_ages, &raw_ages, &matches);

        let faces = new_boxes
            .into_iter()
            .zip(ages)
            .map(|(bbox, age)| TrackedFace::detected(bbox, age))
            .collect();

        log::debug!(
            "Reconciled {} detections: {} matched, {} lost during replay of {} frames",
            detections.len(),
            matches.len(),
            lost_in_replay,
            replay.len()
        );

        Reconciliation {
            faces,
            tracker,
            matched: matches.len(),
            lost_in_replay,
        }
    }
}

impl Default for FaceReconciler {
    fn default() -> Self {
        Self::new(DetectionMatcher::default(), AgeSmoother::default())
    }
}
