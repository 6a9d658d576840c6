pub mod bounding_box;
pub mod constants;
pub mod frame;
pub mod image_codec;
