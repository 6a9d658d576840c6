pub mod box_tracker;
pub mod tracked_face;
