//! JsonlSink - appends outcomes to one aggregate JSONL stream

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, Outcome, ResultSink};
use tracing::{debug, instrument};

/// Sink that appends one JSON record per outcome to a single file, in
/// arrival order. In content-only mode each line is the extracted response
/// text as a JSON string, which keeps the one-record-per-line framing even
/// for multi-line completions.
pub struct JsonlSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    content_only: bool,
}

impl JsonlSink {
    /// Open (or create) the aggregate stream for appending.
    pub fn create(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        content_only: bool,
    ) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: BufWriter::new(file),
            content_only,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_record(&mut self, outcome: &Outcome) -> std::io::Result<()> {
        if self.content_only {
            serde_json::to_writer(&mut self.writer, &outcome.content_text())
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        } else {
            serde_json::to_writer(&mut self.writer, outcome)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        }
        self.writer.write_all(b"\n")
    }
}

impl ResultSink for JsonlSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "jsonl_sink_write",
        skip(self, outcome),
        fields(sink = %self.name, custom_id = %outcome.custom_id())
    )]
    async fn write(&mut self, outcome: &Outcome) -> Result<(), ContractError> {
        self.append_record(outcome)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "jsonl_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "jsonl_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, "JsonlSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FailureKind;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_appends_records_in_arrival_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let mut sink = JsonlSink::create("aggregate", &path, false).unwrap();
        sink.write(&Outcome::success("a", json!({"n": 1}))).await.unwrap();
        sink.write(&Outcome::failure("b", FailureKind::Request, "boom"))
            .await
            .unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["custom_id"], "a");
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["error"]["message"], "boom");
    }

    #[tokio::test]
    async fn test_content_only_writes_json_strings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let mut sink = JsonlSink::create("aggregate", &path, true).unwrap();
        let outcome = Outcome::success(
            "a",
            json!({"choices": [{"message": {"content": "line one\nline two"}}]}),
        );
        sink.write(&outcome).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let text: String = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[tokio::test]
    async fn test_reopening_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let mut sink = JsonlSink::create("aggregate", &path, false).unwrap();
        sink.write(&Outcome::success("a", json!({}))).await.unwrap();
        sink.close().await.unwrap();

        let mut sink = JsonlSink::create("aggregate", &path, false).unwrap();
        sink.write(&Outcome::success("b", json!({}))).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
