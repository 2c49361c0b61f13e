//! Delivery - Where Finished Scripts Go
//!
//! The engine hands final text to a `ScriptSink`. A desktop front-end would
//! implement it over the clipboard; this crate ships an in-memory sink, a
//! stdout sink and a file exporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::hashing::sha256_hex;
use crate::resolver::ScriptKind;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// What is being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Script(ScriptKind),
    NewMembership,
}

impl OutputKind {
    /// File stem used by the file exporter.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Script(ScriptKind::Feature) => "feature",
            Self::Script(ScriptKind::Comment) => "comment",
            Self::Script(ScriptKind::OriginalPost) => "original_post",
            Self::NewMembership => "new_membership",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(kind) => write!(f, "{kind}"),
            Self::NewMembership => f.write_str("new membership"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: String,
    pub kind: OutputKind,
    pub path: Option<PathBuf>,
    pub exported_at: DateTime<Utc>,
    pub sha256: String,
    pub bytes: usize,
}

impl ExportRecord {
    fn new(kind: OutputKind, path: Option<PathBuf>, text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            path,
            exported_at: Utc::now(),
            sha256: sha256_hex(text.as_bytes()),
            bytes: text.len(),
        }
    }
}

pub trait ScriptSink {
    fn deliver(&mut self, kind: OutputKind, text: &str) -> Result<ExportRecord, SinkError>;
}

/// Keeps every delivery; used by tests and embedding callers.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub deliveries: Vec<(OutputKind, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&str> {
        self.deliveries.last().map(|(_, text)| text.as_str())
    }
}

impl ScriptSink for MemorySink {
    fn deliver(&mut self, kind: OutputKind, text: &str) -> Result<ExportRecord, SinkError> {
        self.deliveries.push((kind, text.to_string()));
        Ok(ExportRecord::new(kind, None, text))
    }
}

pub struct StdoutSink;

impl ScriptSink for StdoutSink {
    fn deliver(&mut self, kind: OutputKind, text: &str) -> Result<ExportRecord, SinkError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()?;
        Ok(ExportRecord::new(kind, None, text))
    }
}

/// Writes `<stem>.txt` into a directory, replacing earlier exports of the
/// same kind.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ScriptSink for FileSink {
    fn deliver(&mut self, kind: OutputKind, text: &str) -> Result<ExportRecord, SinkError> {
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::Write {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(format!("{}.txt", kind.file_stem()));
        fs::write(&path, text).map_err(|source| SinkError::Write { path: path.clone(), source })?;
        info!(%kind, path = %path.display(), "Exported script");
        Ok(ExportRecord::new(kind, Some(path), text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_writes_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("out"));
        let record = sink.deliver(OutputKind::Script(ScriptKind::OriginalPost), "hello").unwrap();

        let path = record.path.unwrap();
        assert_eq!(path.file_name().unwrap(), "original_post.txt");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert_eq!(record.sha256, sha256_hex(b"hello"));
        assert_eq!(record.bytes, 5);
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        sink.deliver(OutputKind::Script(ScriptKind::Feature), "a").unwrap();
        sink.deliver(OutputKind::NewMembership, "b").unwrap();
        assert_eq!(sink.deliveries.len(), 2);
        assert_eq!(sink.last(), Some("b"));
    }
}
