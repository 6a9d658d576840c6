pub mod box_color;
pub mod frame_annotator;
