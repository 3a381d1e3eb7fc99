//! Run metric collection
//!
//! Records per-outcome and per-poll metrics, and aggregates run statistics
//! for the end-of-run summary.

use std::collections::HashMap;

use contracts::{FailureKind, Outcome};
use metrics::counter;

/// Record one terminal outcome.
///
/// Call once per outcome as the dispatcher reports it.
pub fn record_outcome_metrics(outcome: &Outcome) {
    match outcome {
        Outcome::Success { .. } => {
            counter!("aidispatch_outcomes_total", "status" => "success").increment(1);
        }
        Outcome::Failure { error, .. } => {
            counter!("aidispatch_outcomes_total", "status" => "failure").increment(1);
            counter!(
                "aidispatch_failures_total",
                "kind" => failure_kind_label(error.kind)
            )
            .increment(1);
        }
    }
}

fn failure_kind_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Request => "request",
        FailureKind::ProviderJob => "provider_job",
        FailureKind::Expired => "expired",
        FailureKind::MissingResult => "missing_result",
    }
}

/// Aggregates outcome statistics for one run
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    succeeded: u64,
    failed: u64,
    failure_kinds: HashMap<&'static str, u64>,
}

impl RunMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the aggregate
    pub fn update(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success { .. } => self.succeeded += 1,
            Outcome::Failure { error, .. } => {
                self.failed += 1;
                *self
                    .failure_kinds
                    .entry(failure_kind_label(error.kind))
                    .or_insert(0) += 1;
            }
        }
    }

    /// Summary for reporting
    pub fn summary(&self) -> RunMetricsSummary {
        let total = self.succeeded + self.failed;
        let failure_rate = if total > 0 {
            (self.failed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let mut failure_kinds: Vec<(&'static str, u64)> =
            self.failure_kinds.iter().map(|(k, v)| (*k, *v)).collect();
        failure_kinds.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        RunMetricsSummary {
            succeeded: self.succeeded,
            failed: self.failed,
            failure_rate,
            failure_kinds,
        }
    }
}

/// Aggregated statistics for one run
#[derive(Debug, Clone)]
pub struct RunMetricsSummary {
    pub succeeded: u64,
    pub failed: u64,
    /// Failures as a percentage of all outcomes
    pub failure_rate: f64,
    /// Failure counts per kind, largest first
    pub failure_kinds: Vec<(&'static str, u64)>,
}
