//! Sink implementations
//!
//! Contains JsonlSink (aggregate stream), DirSink (file per id), and
//! LogSink.

mod dir;
mod jsonl;
mod log;

pub use self::dir::DirSink;
pub use self::jsonl::JsonlSink;
pub use self::log::LogSink;
