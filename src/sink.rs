use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::debug;

use crate::{Error, Result};

/// Append-only CSV output. Nothing written is ever rewritten or removed.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    columns: &'static [&'static str],
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, columns: &'static [&'static str]) -> Self {
        CsvSink {
            path: path.into(),
            columns,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `rows` in order. The header goes first only when the file does
    /// not exist at call time, checked on every call.
    pub async fn append<R: Serialize>(&self, rows: &[R]) -> Result<usize> {
        let write_header = !self.exists().await;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        if write_header {
            wtr.write_record(self.columns)?;
        }
        for row in rows {
            wtr.serialize(row)?;
        }
        let bytes = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;

        self.write(&bytes).await?;
        debug!(
            path = %self.path.display(),
            rows = rows.len(),
            header = write_header,
            "appended rows"
        );
        Ok(rows.len())
    }

    /// Creates a header-only file if nothing exists yet. Returns whether it did.
    pub async fn ensure_header(&self) -> Result<bool> {
        if self.exists().await {
            return Ok(false);
        }
        self.append::<()>(&[]).await?;
        Ok(true)
    }

    async fn exists(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}
