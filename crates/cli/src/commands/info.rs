//! `info` command implementation.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Request file report for JSON output
#[derive(Serialize)]
struct RequestFileReport {
    path: String,
    request_count: usize,
    unique_ids: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    duplicate_ids: Vec<String>,
    /// Requests per endpoint path
    endpoints: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sample_ids: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(requests = %args.requests.display(), "Inspecting request file");

    let batch = dispatcher::read_request_file(&args.requests)
        .with_context(|| format!("Failed to read {}", args.requests.display()))?;

    let mut seen: HashSet<&str> = HashSet::with_capacity(batch.len());
    let mut duplicate_ids = Vec::new();
    let mut endpoints: BTreeMap<String, usize> = BTreeMap::new();

    for request in &batch {
        if !seen.insert(request.custom_id.as_str()) {
            duplicate_ids.push(request.custom_id.to_string());
        }
        *endpoints.entry(request.url.clone()).or_insert(0) += 1;
    }

    let report = RequestFileReport {
        path: args.requests.display().to_string(),
        request_count: batch.len(),
        unique_ids: seen.len(),
        duplicate_ids,
        endpoints,
        sample_ids: batch
            .iter()
            .take(5)
            .map(|request| request.custom_id.to_string())
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.duplicate_ids.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Request file contains duplicate custom_ids")
    }
}

fn print_report(report: &RequestFileReport) {
    println!("\n=== Request File ===\n");
    println!("Path: {}", report.path);
    println!("Requests: {}", report.request_count);
    println!("Unique ids: {}", report.unique_ids);

    if !report.duplicate_ids.is_empty() {
        println!("\nDuplicate ids ({}):", report.duplicate_ids.len());
        for custom_id in &report.duplicate_ids {
            println!("  - {}", custom_id);
        }
    }

    if !report.endpoints.is_empty() {
        println!("\nEndpoints:");
        for (url, count) in &report.endpoints {
            println!("  {} ({} requests)", url, count);
        }
    }

    if !report.sample_ids.is_empty() {
        println!("\nSample ids: {}", report.sample_ids.join(", "));
    }

    println!();
}
