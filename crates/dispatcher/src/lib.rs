//! # Dispatcher
//!
//! Request execution engine.
//!
//! Responsibilities:
//! - Read request files and enforce id uniqueness
//! - Drive a batch to completion with one of three strategies
//! - Stream every outcome to the result sink as soon as it is known
//! - Guarantee exactly one outcome per request id, whatever the provider does

pub mod batch;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;
mod strategies;

pub use contracts::{ApiClient, Outcome, ResultSink};
pub use batch::read_request_file;
pub use dispatcher::{create_sink_handle, Dispatcher, RunSummary};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{DirSink, JsonlSink, LogSink};
