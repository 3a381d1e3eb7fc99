//! Run statistics and summary reporting.

use std::time::Duration;

use contracts::ExecutionMode;
use observability::RunMetricsSummary;

/// Statistics from one batch run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Provider the batch ran against
    pub provider: String,

    /// Execution mode used
    pub mode: ExecutionMode,

    /// Result destination spec
    pub destination: String,

    /// Requests handed to the dispatcher
    pub total: usize,

    /// Outcomes that carried a response
    pub succeeded: usize,

    /// Outcomes that carried an error
    pub failed: usize,

    /// Total duration of the run
    pub duration: Duration,

    /// Whether the run was cancelled before completing
    pub cancelled: bool,

    /// Outcomes persisted by the sink
    pub sink_writes: u64,

    /// Sink write failures
    pub sink_write_failures: u64,

    /// Aggregated outcome metrics
    pub outcome_metrics: RunMetricsSummary,
}

impl RunStats {
    /// Outcomes recorded (equals `total` for an uncancelled run)
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Requests completed per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.completed() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                        Run Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Provider: {}", self.provider);
        println!("   ├─ Mode: {}", self.mode);
        println!("   ├─ Destination: {}", self.destination);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   └─ Throughput: {:.2} req/s", self.throughput());

        println!("\nOutcomes");
        println!("   ├─ Requests: {}", self.total);
        println!("   ├─ Succeeded: {}", self.succeeded);
        println!("   ├─ Failed: {}", self.failed);
        println!(
            "   └─ Failure rate: {:.2}%",
            self.outcome_metrics.failure_rate
        );

        if !self.outcome_metrics.failure_kinds.is_empty() {
            println!("\nFailure Kinds");
            for (kind, count) in &self.outcome_metrics.failure_kinds {
                println!("   ├─ {}: {}", kind, count);
            }
        }

        println!("\nSink");
        println!("   ├─ Writes: {}", self.sink_writes);
        println!("   └─ Write failures: {}", self.sink_write_failures);

        if self.cancelled {
            println!(
                "\nRun was cancelled: {} of {} requests completed",
                self.completed(),
                self.total
            );
        }

        println!();
    }
}
