//! LogSink - logs outcome summary via tracing

use contracts::{ContractError, Outcome, ResultSink};
use tracing::{info, instrument};

/// Sink that logs outcome summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_outcome_summary(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Success { custom_id, .. } => {
                info!(
                    sink = %self.name,
                    custom_id = %custom_id,
                    status = "success",
                    "Outcome received"
                );
            }
            Outcome::Failure { custom_id, error } => {
                info!(
                    sink = %self.name,
                    custom_id = %custom_id,
                    status = "failure",
                    kind = ?error.kind,
                    error = %error.message,
                    "Outcome received"
                );
            }
        }
    }
}

impl ResultSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, outcome),
        fields(sink = %self.name, custom_id = %outcome.custom_id())
    )]
    async fn write(&mut self, outcome: &Outcome) -> Result<(), ContractError> {
        self.log_outcome_summary(outcome);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
