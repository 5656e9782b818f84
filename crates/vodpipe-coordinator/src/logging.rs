//! Structured per-message logging.
//!
//! Every log line carries the correlation id and stage name so one upload's
//! trail can be pulled out of the combined stream.

use tracing::{error, info, warn, Span};

use vodpipe_models::CorrelationId;

/// Logger scoped to one upload message moving through a stage.
#[derive(Debug, Clone)]
pub struct StageLogger {
    correlation_id: String,
    stage: String,
}

impl StageLogger {
    /// Create a logger for one correlation id and stage.
    pub fn new(correlation_id: &CorrelationId, stage: &str) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            stage: stage.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            correlation_id = %self.correlation_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            correlation_id = %self.correlation_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            correlation_id = %self.correlation_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            correlation_id = %self.correlation_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            correlation_id = %self.correlation_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Create a tracing span for this message.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            correlation_id = %self.correlation_id,
            stage = %self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_logger_creation() {
        let id = CorrelationId::from_string("abc123");
        let logger = StageLogger::new(&id, "encode_submission");

        assert_eq!(logger.correlation_id(), "abc123");
        assert_eq!(logger.stage(), "encode_submission");
    }
}
