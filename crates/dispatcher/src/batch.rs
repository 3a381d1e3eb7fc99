//! Request file reading
//!
//! The request file is newline-delimited JSON, one `ApiRequest` per line.
//! Blank lines are skipped; a malformed line aborts the read with its line
//! number, before anything is dispatched.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use contracts::ApiRequest;
use tracing::{debug, instrument};

use crate::error::DispatcherError;

/// Read the full ordered batch from a JSONL request file.
#[instrument(name = "read_request_file", skip(path), fields(path = %path.display()))]
pub fn read_request_file(path: &Path) -> Result<Vec<ApiRequest>, DispatcherError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut requests = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let request: ApiRequest =
            serde_json::from_str(&line).map_err(|e| DispatcherError::InvalidRequestRecord {
                line: index + 1,
                message: e.to_string(),
            })?;
        requests.push(request);
    }

    debug!(requests = requests.len(), "request file read");
    Ok(requests)
}
