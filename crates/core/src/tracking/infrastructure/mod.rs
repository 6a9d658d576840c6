pub mod template_tracker;

use crate::tracking::domain::box_tracker::{BoxTrackerFactory, TrackerAlgorithm};
use template_tracker::TemplateTrackerFactory;

/// Tracker factory for the configured algorithm.
pub fn create_tracker_factory(algorithm: TrackerAlgorithm) -> Box<dyn BoxTrackerFactory> {
    log::info!("Using {algorithm} box tracker");
    Box::new(TemplateTrackerFactory::new(algorithm))
}
