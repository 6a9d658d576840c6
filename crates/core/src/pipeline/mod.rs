pub mod face_reconciler;
pub mod pipeline_config;
pub mod pipeline_logger;
pub mod stream_faces_use_case;
