//! DirSink - writes one file per outcome, named by its id

use std::fs::{self, File};
use std::path::PathBuf;

use contracts::{ContractError, Outcome, ResultSink};
use tracing::{debug, instrument};

/// Sink that materializes each outcome as its own file under a base
/// directory: `{custom_id}.json`, or `{custom_id}.txt` in content-only
/// mode. Callers own id hygiene; ids that would escape the directory are
/// rejected.
pub struct DirSink {
    name: String,
    base_path: PathBuf,
    content_only: bool,
}

impl DirSink {
    /// Create the sink, creating the base directory if needed.
    pub fn create(
        name: impl Into<String>,
        base_path: impl Into<PathBuf>,
        content_only: bool,
    ) -> std::io::Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            name: name.into(),
            base_path,
            content_only,
        })
    }

    fn file_path(&self, custom_id: &str) -> Result<PathBuf, ContractError> {
        if custom_id.is_empty()
            || custom_id == "."
            || custom_id == ".."
            || custom_id.contains('/')
            || custom_id.contains('\\')
        {
            return Err(ContractError::sink_write(
                &self.name,
                format!("custom_id '{custom_id}' is not usable as a file name"),
            ));
        }

        let extension = if self.content_only { "txt" } else { "json" };
        Ok(self.base_path.join(format!("{custom_id}.{extension}")))
    }

    fn write_outcome(&self, outcome: &Outcome) -> Result<(), ContractError> {
        let path = self.file_path(outcome.custom_id())?;

        if self.content_only {
            fs::write(&path, outcome.content_text())
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
        } else {
            let file = File::create(&path)
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
            serde_json::to_writer_pretty(file, outcome)
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
        }
    }
}

impl ResultSink for DirSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "dir_sink_write",
        skip(self, outcome),
        fields(sink = %self.name, custom_id = %outcome.custom_id())
    )]
    async fn write(&mut self, outcome: &Outcome) -> Result<(), ContractError> {
        self.write_outcome(outcome)
    }

    #[instrument(name = "dir_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Each write is its own file; nothing buffered
        Ok(())
    }

    #[instrument(name = "dir_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "DirSink closed");
        Ok(())
    }
}
