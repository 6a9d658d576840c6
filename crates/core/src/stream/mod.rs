pub mod frame_ingest;
pub mod frame_source;
pub mod mjpeg;
