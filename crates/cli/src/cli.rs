//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::ExecutionMode;
use std::path::PathBuf;

/// aidispatch - batched request driver for generative-model APIs
#[derive(Parser, Debug)]
#[command(
    name = "aidispatch",
    author,
    version,
    about = "Drive a file of prompt requests against a generative-model API",
    long_about = "Reads a JSONL file of prompt requests, dispatches them to an \n\
                  OpenAI- or Ollama-compatible API using the configured execution \n\
                  strategy (native batch, synchronous, or bounded asynchronous), \n\
                  and materializes one correlated result per request id."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "AIDISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "AIDISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a request file against the configured API
    Run(RunArgs),

    /// Validate a plan file without running
    Validate(ValidateArgs),

    /// Display request file information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to plan file (TOML or JSON)
    #[arg(short, long, default_value = "plan.toml", env = "AIDISPATCH_PLAN")]
    pub config: PathBuf,

    /// Path to the JSONL request file
    #[arg(short, long, env = "AIDISPATCH_REQUESTS")]
    pub requests: PathBuf,

    /// Override execution mode from the plan
    #[arg(long, value_enum, env = "AIDISPATCH_MODE")]
    pub mode: Option<ModeArg>,

    /// Override result destination (trailing '/' selects one file per id)
    #[arg(short, long, env = "AIDISPATCH_OUTPUT")]
    pub output: Option<String>,

    /// Write only the extracted response content
    #[arg(long)]
    pub content_only: bool,

    /// Override batch poll interval in seconds
    #[arg(long, env = "AIDISPATCH_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Override inter-request delay in seconds
    #[arg(long, env = "AIDISPATCH_REQUEST_INTERVAL")]
    pub request_interval: Option<u64>,

    /// Override in-flight request ceiling
    #[arg(long, env = "AIDISPATCH_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Override sink worker queue capacity
    #[arg(long, env = "AIDISPATCH_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "AIDISPATCH_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate plan and request file, then exit without dispatching
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to plan file to validate
    #[arg(short, long, default_value = "plan.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to the JSONL request file
    #[arg(short, long)]
    pub requests: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Execution mode selector
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    /// Provider-side batch job, polled to completion
    NativeBatch,
    /// Serial, input order preserved
    Synchronous,
    /// Concurrent with a bounded in-flight ceiling
    Asynchronous,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::NativeBatch => ExecutionMode::NativeBatch,
            ModeArg::Synchronous => ExecutionMode::Synchronous,
            ModeArg::Asynchronous => ExecutionMode::Asynchronous,
        }
    }
}
