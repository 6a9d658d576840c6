pub mod box_annotator;
pub mod segment_font;
