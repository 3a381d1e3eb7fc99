//! ResultSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for result sinks.

use crate::{ContractError, Outcome};

/// Result output trait
///
/// All sink implementations must implement this trait. `write` is called
/// once per outcome, in whatever order the active strategy produces them;
/// the caller serializes concurrent writes through a single worker.
#[trait_variant::make(ResultSink: Send)]
pub trait LocalResultSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one correlated outcome
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, outcome: &Outcome) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
