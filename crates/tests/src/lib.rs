//! # Integration Tests
//!
//! End-to-end tests against the scriptable mock client.
//!
//! Responsibilities:
//! - Outcome-count / id-set invariants for all three strategies
//! - Ordering and concurrency-ceiling guarantees
//! - Native batch polling, retrieval and correlation edge cases
//! - Full pipeline runs into real sinks

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use api_client::MockApiClient;
    use contracts::{
        ApiRequest, ContractError, ExecutionConfig, ExecutionMode, Outcome, ResultSink,
    };
    use dispatcher::{Dispatcher, RunSummary, SinkHandle};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    /// Sink that keeps every outcome in memory for assertions.
    pub struct CollectingSink {
        outcomes: Arc<Mutex<Vec<Outcome>>>,
    }

    impl CollectingSink {
        pub fn new() -> (Self, Arc<Mutex<Vec<Outcome>>>) {
            let outcomes = Arc::new(Mutex::new(Vec::new()));
            let sink = Self {
                outcomes: Arc::clone(&outcomes),
            };
            (sink, outcomes)
        }
    }

    impl ResultSink for CollectingSink {
        fn name(&self) -> &str {
            "collector"
        }

        async fn write(&mut self, outcome: &Outcome) -> Result<(), ContractError> {
            self.outcomes.lock().unwrap().push(outcome.clone());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    pub fn batch_of(ids: &[&str]) -> Vec<ApiRequest> {
        ids.iter()
            .map(|id| ApiRequest::new(*id, json!({"messages": []})))
            .collect()
    }

    /// Execution config with all delays zeroed so tests run fast.
    pub fn fast_config(mode: ExecutionMode) -> ExecutionConfig {
        ExecutionConfig {
            mode,
            request_interval_secs: 0,
            poll_interval_secs: 0,
            ..Default::default()
        }
    }

    /// Drive one full run into a collecting sink.
    pub async fn run_collected(
        client: Arc<MockApiClient>,
        config: ExecutionConfig,
        batch: Vec<ApiRequest>,
    ) -> (RunSummary, Vec<Outcome>) {
        run_collected_with_cancel(client, config, batch, CancellationToken::new()).await
    }

    pub async fn run_collected_with_cancel(
        client: Arc<MockApiClient>,
        config: ExecutionConfig,
        batch: Vec<ApiRequest>,
        cancel: CancellationToken,
    ) -> (RunSummary, Vec<Outcome>) {
        let (sink, outcomes) = CollectingSink::new();
        let handle = SinkHandle::spawn(sink, 16);

        let dispatcher = Dispatcher::new(client, config);
        let summary = dispatcher.run(batch, &handle, cancel).await.unwrap();
        handle.shutdown().await;

        let outcomes = outcomes.lock().unwrap().clone();
        (summary, outcomes)
    }

    /// Assert the exactly-one-outcome-per-id invariant.
    pub fn assert_id_set(outcomes: &[Outcome], expected_ids: &[&str]) {
        assert_eq!(outcomes.len(), expected_ids.len());

        let mut actual: Vec<&str> = outcomes.iter().map(|o| o.custom_id().as_str()).collect();
        actual.sort_unstable();
        let mut expected = expected_ids.to_vec();
        expected.sort_unstable();
        assert_eq!(actual, expected);
    }
}

#[cfg(test)]
mod invariant_tests {
    use std::sync::Arc;

    use api_client::{MockApiClient, MockConfig};
    use contracts::{BatchPoll, ExecutionMode, FailureKind, Outcome};
    use serde_json::json;

    use crate::support::{assert_id_set, batch_of, fast_config, run_collected};

    const IDS: [&str; 5] = ["r-0", "r-1", "r-2", "r-3", "r-4"];

    #[tokio::test]
    async fn test_synchronous_one_outcome_per_id() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            fail_requests: vec!["r-1".to_string(), "r-3".to_string()],
            ..Default::default()
        }));

        let (summary, outcomes) = run_collected(
            client,
            fast_config(ExecutionMode::Synchronous),
            batch_of(&IDS),
        )
        .await;

        assert_id_set(&outcomes, &IDS);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 2);
    }

    #[tokio::test]
    async fn test_asynchronous_one_outcome_per_id() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            fail_requests: vec!["r-0".to_string()],
            delays_ms: IDS.iter().map(|id| (id.to_string(), 5)).collect(),
            ..Default::default()
        }));

        let (summary, outcomes) = run_collected(
            client,
            fast_config(ExecutionMode::Asynchronous),
            batch_of(&IDS),
        )
        .await;

        assert_id_set(&outcomes, &IDS);
        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 1);
    }

    /// A provider that echoes an unknown id, repeats a known id, and omits
    /// another must still produce exactly one outcome per known id.
    #[tokio::test]
    async fn test_native_batch_survives_nonconformant_provider() {
        let records = vec![
            MockApiClient::result_record("r-0", json!({"n": 0})),
            MockApiClient::result_record("r-0", json!({"n": 0})),
            MockApiClient::result_record("stray-id", json!({"n": 99})),
            MockApiClient::result_record("r-2", json!({"n": 2})),
            MockApiClient::result_record("r-4", json!({"n": 4})),
            // r-1 and r-3 intentionally absent
        ];
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            poll_script: vec![BatchPoll::completed(records)],
            ..Default::default()
        }));

        let (summary, outcomes) = run_collected(
            client,
            fast_config(ExecutionMode::NativeBatch),
            batch_of(&IDS),
        )
        .await;

        assert_id_set(&outcomes, &IDS);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 2);

        for outcome in &outcomes {
            match outcome {
                Outcome::Failure { custom_id, error } => {
                    assert!(custom_id.as_str() == "r-1" || custom_id.as_str() == "r-3");
                    assert_eq!(error.kind, FailureKind::MissingResult);
                }
                Outcome::Success { custom_id, .. } => {
                    assert_ne!(custom_id.as_str(), "stray-id");
                }
            }
        }
    }
}

#[cfg(test)]
mod ordering_tests {
    use std::sync::Arc;

    use api_client::{MockApiClient, MockConfig};
    use contracts::{ExecutionConfig, ExecutionMode};

    use crate::support::{assert_id_set, batch_of, fast_config, run_collected};

    #[tokio::test]
    async fn test_synchronous_emission_order_equals_input_order() {
        let ids = ["e", "a", "d", "b", "c"];
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            fail_requests: vec!["d".to_string()],
            ..Default::default()
        }));

        let (_, outcomes) = run_collected(
            Arc::clone(&client),
            fast_config(ExecutionMode::Synchronous),
            batch_of(&ids),
        )
        .await;

        let emitted: Vec<&str> = outcomes.iter().map(|o| o.custom_id().as_str()).collect();
        assert_eq!(emitted, ids);
        // A serial strategy never overlaps calls
        assert_eq!(client.max_in_flight(), 1);
    }

    /// Concurrency 2, with the second request finishing well before the
    /// first: three outcomes with correct id-to-result mapping, whatever
    /// the completion order.
    #[tokio::test]
    async fn test_asynchronous_out_of_order_completion_keeps_mapping() {
        let ids = ["slow", "quick", "mid"];
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            delays_ms: [
                ("slow".to_string(), 80),
                ("quick".to_string(), 5),
                ("mid".to_string(), 20),
            ]
            .into(),
            ..Default::default()
        }));

        let config = ExecutionConfig {
            concurrency: 2,
            ..fast_config(ExecutionMode::Asynchronous)
        };
        let (summary, outcomes) = run_collected(client, config, batch_of(&ids)).await;

        assert_id_set(&outcomes, &ids);
        assert_eq!(summary.succeeded, 3);
        for outcome in &outcomes {
            // The mock echoes the id into its response text
            assert_eq!(
                outcome.content_text(),
                format!("response for {}", outcome.custom_id())
            );
        }
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::Arc;

    use api_client::{MockApiClient, MockConfig};
    use contracts::{ExecutionConfig, ExecutionMode};

    use crate::support::{batch_of, fast_config, run_collected};

    async fn run_with_ceiling(concurrency: usize, batch_size: usize) -> Arc<MockApiClient> {
        let ids: Vec<String> = (0..batch_size).map(|i| format!("r-{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let client = Arc::new(MockApiClient::with_config(MockConfig {
            delays_ms: ids.iter().map(|id| (id.clone(), 10)).collect(),
            ..Default::default()
        }));

        let config = ExecutionConfig {
            concurrency,
            ..fast_config(ExecutionMode::Asynchronous)
        };
        let (summary, outcomes) =
            run_collected(Arc::clone(&client), config, batch_of(&id_refs)).await;

        assert_eq!(summary.total, batch_size);
        assert_eq!(outcomes.len(), batch_size);
        client
    }

    #[tokio::test]
    async fn test_admission_ceiling_is_never_exceeded() {
        for concurrency in [1usize, 4, 16] {
            // Batch sizes below, at, and above the ceiling
            for batch_size in [concurrency.saturating_sub(1), concurrency, concurrency * 2 + 1] {
                if batch_size == 0 {
                    continue;
                }
                let client = run_with_ceiling(concurrency, batch_size).await;
                assert!(
                    client.max_in_flight() <= concurrency,
                    "ceiling {} exceeded: {} in flight (batch {})",
                    concurrency,
                    client.max_in_flight(),
                    batch_size
                );
                assert_eq!(client.call_count() as usize, batch_size);
            }
        }
    }

    #[tokio::test]
    async fn test_ceiling_of_one_is_fully_serial() {
        let client = run_with_ceiling(1, 6).await;
        assert_eq!(client.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_wide_ceiling_actually_overlaps() {
        let client = run_with_ceiling(8, 8).await;
        assert!(
            client.max_in_flight() > 1,
            "expected overlapping calls, saw {}",
            client.max_in_flight()
        );
    }
}

#[cfg(test)]
mod native_batch_tests {
    use std::sync::Arc;

    use api_client::{MockApiClient, MockConfig};
    use contracts::{BatchPoll, ContractError, ExecutionConfig, ExecutionMode, FailureKind, Outcome};
    use dispatcher::{Dispatcher, DispatcherError, SinkHandle};
    use tokio::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    use crate::support::{batch_of, fast_config, run_collected, CollectingSink};

    /// k pending polls then completion means exactly k+1 polls, spaced by
    /// the configured interval.
    #[tokio::test(start_paused = true)]
    async fn test_poll_count_and_spacing() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            poll_script: vec![
                BatchPoll::pending(),
                BatchPoll::pending(),
                BatchPoll::completed(vec![MockApiClient::result_record(
                    "a",
                    serde_json::json!({"n": 1}),
                )]),
            ],
            ..Default::default()
        }));

        let config = ExecutionConfig {
            mode: ExecutionMode::NativeBatch,
            poll_interval_secs: 300,
            ..Default::default()
        };

        let started = Instant::now();
        let (summary, outcomes) =
            run_collected(Arc::clone(&client), config, batch_of(&["a"])).await;

        assert_eq!(client.poll_count(), 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(outcomes.len(), 1);

        // Two sleeps of the poll interval under virtual time
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(600));
        assert!(elapsed < Duration::from_secs(601));
    }

    #[tokio::test]
    async fn test_failed_job_blankets_all_ids() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            poll_script: vec![BatchPoll::failed("quota exceeded")],
            ..Default::default()
        }));

        let (summary, outcomes) = run_collected(
            client,
            fast_config(ExecutionMode::NativeBatch),
            batch_of(&["a", "b", "c"]),
        )
        .await;

        assert_eq!(summary.failed, 3);
        for outcome in &outcomes {
            match outcome {
                Outcome::Failure { error, .. } => {
                    assert_eq!(error.kind, FailureKind::ProviderJob);
                    assert!(error.message.contains("quota exceeded"));
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_expired_job_uses_distinct_kind() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            poll_script: vec![BatchPoll::expired("completion window elapsed")],
            ..Default::default()
        }));

        let (_, outcomes) = run_collected(
            client,
            fast_config(ExecutionMode::NativeBatch),
            batch_of(&["a", "b"]),
        )
        .await;

        for outcome in &outcomes {
            match outcome {
                Outcome::Failure { error, .. } => assert_eq!(error.kind, FailureKind::Expired),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    /// A job that never goes terminal hits the local polling deadline and
    /// fails every pending id with the expired kind.
    #[tokio::test(start_paused = true)]
    async fn test_poll_deadline_expires_pending_ids() {
        let client = Arc::new(MockApiClient::new()); // empty script: always pending

        let config = ExecutionConfig {
            mode: ExecutionMode::NativeBatch,
            poll_interval_secs: 300,
            max_poll_secs: Some(600),
            ..Default::default()
        };

        let (summary, outcomes) =
            run_collected(Arc::clone(&client), config, batch_of(&["a", "b"])).await;

        assert_eq!(summary.failed, 2);
        for outcome in &outcomes {
            match outcome {
                Outcome::Failure { error, .. } => {
                    assert_eq!(error.kind, FailureKind::Expired);
                    assert!(error.message.contains("600"));
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_submission_failure_is_fatal() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            fail_submit: Some("input file rejected".to_string()),
            ..Default::default()
        }));

        let (sink, outcomes) = CollectingSink::new();
        let handle = SinkHandle::spawn(sink, 16);
        let dispatcher = Dispatcher::new(client, fast_config(ExecutionMode::NativeBatch));

        let err = dispatcher
            .run(batch_of(&["a", "b"]), &handle, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatcherError::Contract(ContractError::Submission { .. })
        ));
        handle.shutdown().await;
        assert!(outcomes.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use api_client::{MockApiClient, MockConfig};
    use contracts::{ExecutionConfig, ExecutionMode, Outcome, OutputConfig};
    use dispatcher::{create_sink_handle, Dispatcher, DispatcherError};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use crate::support::{batch_of, fast_config, run_collected, run_collected_with_cancel};

    /// Two requests where "a" answers "R1" and "b" dies in transport:
    /// summary {total: 2, success: 1, failure: 1}, and the sink sees the
    /// success for "a" before the failure for "b".
    #[tokio::test]
    async fn test_synchronous_reference_scenario() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            responses: [(
                "a".to_string(),
                json!({"choices": [{"message": {"content": "R1"}}]}),
            )]
            .into(),
            fail_requests: vec!["b".to_string()],
            ..Default::default()
        }));

        let (summary, outcomes) = run_collected(
            client,
            fast_config(ExecutionMode::Synchronous),
            batch_of(&["a", "b"]),
        )
        .await;

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);

        assert_eq!(outcomes[0].custom_id().as_str(), "a");
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[0].content_text(), "R1");

        assert_eq!(outcomes[1].custom_id().as_str(), "b");
        assert!(!outcomes[1].is_success());
    }

    #[tokio::test]
    async fn test_aggregate_pipeline_writes_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("results.jsonl");

        let output = OutputConfig {
            destination: destination.to_string_lossy().into_owned(),
            ..Default::default()
        };
        let sink = create_sink_handle(&output).unwrap();

        let client = Arc::new(MockApiClient::with_config(MockConfig {
            fail_requests: vec!["b".to_string()],
            ..Default::default()
        }));
        let dispatcher = Dispatcher::new(client, fast_config(ExecutionMode::Synchronous));
        let summary = dispatcher
            .run(batch_of(&["a", "b", "c"]), &sink, CancellationToken::new())
            .await
            .unwrap();
        sink.shutdown().await;

        assert_eq!(summary.completed(), 3);

        let content = std::fs::read_to_string(&destination).unwrap();
        let records: Vec<Outcome> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].custom_id().as_str(), "a");
        assert!(!records[1].is_success());
    }

    #[tokio::test]
    async fn test_per_id_pipeline_writes_one_file_per_outcome() {
        let dir = tempfile::tempdir().unwrap();
        // Trailing separator selects per-id mode
        let destination = format!("{}/", dir.path().join("out").to_string_lossy());

        let output = OutputConfig {
            destination,
            ..Default::default()
        };
        let sink = create_sink_handle(&output).unwrap();

        let client = Arc::new(MockApiClient::new());
        let dispatcher = Dispatcher::new(client, fast_config(ExecutionMode::Asynchronous));
        dispatcher
            .run(batch_of(&["a", "b"]), &sink, CancellationToken::new())
            .await
            .unwrap();
        sink.shutdown().await;

        let out = dir.path().join("out");
        assert!(out.join("a.json").exists());
        assert!(out.join("b.json").exists());
    }

    /// Cancellation stops admission but records everything already in
    /// flight, and the run still returns a (partial) summary.
    #[tokio::test(start_paused = true)]
    async fn test_cancellation_returns_partial_summary() {
        let ids = ["a", "b", "c"];
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            delays_ms: ids.iter().map(|id| (id.to_string(), 30)).collect(),
            ..Default::default()
        }));

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let config = ExecutionConfig {
            concurrency: 1,
            ..fast_config(ExecutionMode::Asynchronous)
        };
        let (summary, outcomes) =
            run_collected_with_cancel(Arc::clone(&client), config, batch_of(&ids), cancel).await;

        // Only "a" was admitted before the cancel landed; it still completed
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed(), 1);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].custom_id().as_str(), "a");
        assert!(outcomes[0].is_success());
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_aborts_before_any_call() {
        let client = Arc::new(MockApiClient::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&client),
            fast_config(ExecutionMode::Asynchronous),
        );
        let sink = dispatcher::SinkHandle::spawn(dispatcher::LogSink::new("log"), 8);

        let err = dispatcher
            .run(batch_of(&["a", "b", "a"]), &sink, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatcherError::DuplicateRequestId { .. }));
        assert_eq!(client.call_count(), 0);
        sink.shutdown().await;
    }

    /// Re-running the same batch against a deterministic client yields the
    /// same per-id success/failure statuses.
    #[tokio::test]
    async fn test_idempotent_rerun_matches_statuses() {
        let ids = ["a", "b", "c", "d"];
        let mock_config = MockConfig {
            fail_requests: vec!["c".to_string()],
            ..Default::default()
        };

        let mut runs = Vec::new();
        for _ in 0..2 {
            let client = Arc::new(MockApiClient::with_config(mock_config.clone()));
            let (_, outcomes) = run_collected(
                client,
                fast_config(ExecutionMode::Asynchronous),
                batch_of(&ids),
            )
            .await;

            let mut statuses: Vec<(String, bool)> = outcomes
                .iter()
                .map(|o| (o.custom_id().to_string(), o.is_success()))
                .collect();
            statuses.sort();
            runs.push(statuses);
        }

        assert_eq!(runs[0], runs[1]);
    }
}

#[cfg(test)]
mod plan_tests {
    use std::sync::Arc;

    use api_client::{MockApiClient, MockConfig};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::ExecutionMode;
    use observability::RunMetricsAggregator;

    use crate::support::{batch_of, fast_config, run_collected};

    const FULL_PLAN: &str = r#"
[api]
provider = "openai"
base_url = "https://api.example.com"
api_key_env = "EXAMPLE_KEY"

[execution]
mode = "asynchronous"
concurrency = 16
request_interval_secs = 0

[execution.retry]
max_attempts = 2
backoff_secs = 5

[output]
destination = "out/"
content_only = true
"#;

    #[test]
    fn test_full_plan_parses_with_every_section() {
        let plan = ConfigLoader::load_from_str(FULL_PLAN, ConfigFormat::Toml).unwrap();
        assert_eq!(plan.execution.mode, ExecutionMode::Asynchronous);
        assert_eq!(plan.execution.concurrency, 16);
        assert!(plan.execution.retry.enabled());
        assert_eq!(plan.api.api_key_env, "EXAMPLE_KEY");
        assert!(plan.output.content_only);
        assert!(matches!(
            plan.output.target(),
            contracts::OutputTarget::PerRequest(_)
        ));
    }

    /// The metrics aggregator over a run's outcomes agrees with the
    /// dispatcher's own summary.
    #[tokio::test]
    async fn test_aggregator_agrees_with_run_summary() {
        let client = Arc::new(MockApiClient::with_config(MockConfig {
            fail_requests: vec!["b".to_string(), "d".to_string()],
            ..Default::default()
        }));

        let (summary, outcomes) = run_collected(
            client,
            fast_config(ExecutionMode::Synchronous),
            batch_of(&["a", "b", "c", "d"]),
        )
        .await;

        let mut aggregator = RunMetricsAggregator::new();
        for outcome in &outcomes {
            aggregator.update(outcome);
        }
        let metrics = aggregator.summary();

        assert_eq!(metrics.succeeded as usize, summary.succeeded);
        assert_eq!(metrics.failed as usize, summary.failed);
        assert_eq!(metrics.failure_kinds, vec![("request", 2)]);
    }
}
