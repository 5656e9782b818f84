//! Shared data models for the VodPipe encode pipeline.

pub mod correlation;
pub mod processing_state;

pub use correlation::CorrelationId;
pub use processing_state::{ProcessingState, VIDEO_TITLE_PROPERTY};
