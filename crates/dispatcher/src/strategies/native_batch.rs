//! Native batch strategy - one provider-side job for the whole batch
//!
//! Building → Submitted → Polling → {Completed, Failed, Expired}. Only
//! submission failures are fatal; once the job exists, every path ends in
//! one outcome per request id. Retrieval correlates raw result records back
//! to requests by the configured id field, discarding unknown ids and
//! back-filling missing ones.

use std::collections::HashSet;

use contracts::{
    ApiClient, ApiRequest, BatchJobState, ExecutionConfig, FailureKind, Outcome,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;

#[instrument(
    name = "native_batch_strategy",
    skip_all,
    fields(requests = batch.len(), poll_interval_secs = config.poll_interval_secs)
)]
pub(crate) async fn run<C: ApiClient + Send + Sync>(
    client: &C,
    config: &ExecutionConfig,
    outcome_tx: &mpsc::Sender<Outcome>,
    cancel: &CancellationToken,
    batch: &[ApiRequest],
) -> Result<(), DispatcherError> {
    if batch.is_empty() {
        return Ok(());
    }

    let handle = client.submit_batch(batch).await?;
    info!(job_id = %handle, requests = batch.len(), "batch job submitted");

    let mut pending: HashSet<String> = batch
        .iter()
        .map(|request| request.custom_id.to_string())
        .collect();
    let started = Instant::now();

    loop {
        let poll = match client.poll_batch(&handle).await {
            Ok(poll) => poll,
            Err(e) => {
                // The job may still run provider-side, but we can no longer
                // observe it; every pending id gets a terminal outcome.
                warn!(job_id = %handle, error = %e, "batch poll failed");
                emit_blanket(
                    outcome_tx,
                    batch,
                    &pending,
                    FailureKind::ProviderJob,
                    &format!("batch poll failed: {e}"),
                )
                .await;
                return Ok(());
            }
        };

        debug!(job_id = %handle, state = poll.state.as_str(), "batch job polled");

        match poll.state {
            BatchJobState::Pending => {
                if let Some(max_poll_secs) = config.max_poll_secs {
                    if started.elapsed() >= Duration::from_secs(max_poll_secs) {
                        warn!(job_id = %handle, max_poll_secs, "polling deadline reached");
                        emit_blanket(
                            outcome_tx,
                            batch,
                            &pending,
                            FailureKind::Expired,
                            &format!("no terminal state within {max_poll_secs}s of polling"),
                        )
                        .await;
                        return Ok(());
                    }
                }

                let interrupted = tokio::select! {
                    _ = cancel.cancelled() => true,
                    _ = sleep(Duration::from_secs(config.poll_interval_secs)) => false,
                };
                if interrupted {
                    info!(job_id = %handle, "cancelled while polling, abandoning job");
                    return Ok(());
                }
            }
            BatchJobState::Completed => {
                let records = poll.results.unwrap_or_default();
                info!(job_id = %handle, records = records.len(), "batch job completed");
                correlate(outcome_tx, config, batch, &mut pending, records).await;
                return Ok(());
            }
            BatchJobState::Failed => {
                let reason = poll
                    .reason
                    .unwrap_or_else(|| "provider aborted the job".to_string());
                warn!(job_id = %handle, reason = %reason, "batch job failed");
                emit_blanket(outcome_tx, batch, &pending, FailureKind::ProviderJob, &reason).await;
                return Ok(());
            }
            BatchJobState::Expired => {
                let reason = poll
                    .reason
                    .unwrap_or_else(|| "batch job expired".to_string());
                warn!(job_id = %handle, reason = %reason, "batch job expired");
                emit_blanket(outcome_tx, batch, &pending, FailureKind::Expired, &reason).await;
                return Ok(());
            }
        }
    }
}

/// Map retrieved records to outcomes, then back-fill ids the provider
/// never answered for.
async fn correlate(
    outcome_tx: &mpsc::Sender<Outcome>,
    config: &ExecutionConfig,
    batch: &[ApiRequest],
    pending: &mut HashSet<String>,
    records: Vec<Value>,
) {
    for record in records {
        let custom_id = record
            .get(&config.id_field)
            .and_then(Value::as_str)
            .map(str::to_string);

        let Some(custom_id) = custom_id else {
            warn!(
                id_field = %config.id_field,
                "result record carries no usable id, discarding"
            );
            continue;
        };

        if !pending.remove(&custom_id) {
            // Providers may echo extra metadata records
            warn!(custom_id = %custom_id, "result record for unknown id, discarding");
            continue;
        }

        if outcome_tx
            .send(outcome_from_record(&custom_id, record))
            .await
            .is_err()
        {
            return;
        }
    }

    for request in batch {
        if pending.contains(request.custom_id.as_str()) {
            let outcome = Outcome::failure(
                request.custom_id.clone(),
                FailureKind::MissingResult,
                "missing from provider response",
            );
            if outcome_tx.send(outcome).await.is_err() {
                return;
            }
        }
    }
}

/// One failure outcome per still-pending id, in input order.
async fn emit_blanket(
    outcome_tx: &mpsc::Sender<Outcome>,
    batch: &[ApiRequest],
    pending: &HashSet<String>,
    kind: FailureKind,
    message: &str,
) {
    for request in batch {
        if pending.contains(request.custom_id.as_str()) {
            let outcome = Outcome::failure(request.custom_id.clone(), kind, message);
            if outcome_tx.send(outcome).await.is_err() {
                return;
            }
        }
    }
}

/// Build an outcome from one raw provider record.
fn outcome_from_record(custom_id: &str, mut record: Value) -> Outcome {
    if let Some(error) = record.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Outcome::failure(custom_id, FailureKind::Request, message);
    }

    let body = record
        .pointer_mut("/response/body")
        .map(Value::take)
        .or_else(|| {
            record
                .get_mut("response")
                .map(Value::take)
                .filter(|response| !response.is_null())
        })
        .unwrap_or(record);

    Outcome::success(custom_id, body)
}
