//! Event log abstraction — newline-delimited JSON, append-only.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use vx_protocol::LogEntry;

use crate::error::StoreResult;

/// Append-only store of [`LogEntry`] records.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &LogEntry) -> StoreResult<()>;

    /// Read every well-formed entry, oldest first. A missing log reads as
    /// empty.
    async fn read_all(&self) -> StoreResult<Vec<LogEntry>>;
}

/// NDJSON event log on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn append(&self, entry: &LogEntry) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_all(&self) -> StoreResult<Vec<LogEntry>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(parse_lines(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parse NDJSON content, skipping blank and malformed lines.
pub fn parse_lines(content: &str) -> Vec<LogEntry> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(line = idx + 1, error = %e, "skipping malformed log line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vx_protocol::{INTENT_PARSED, Intent};

    #[test]
    fn parse_skips_bad_lines() {
        let content = concat!(
            r#"{"event_type":"INTENT_PARSED","payload":{"text":"a","intent_id":"UNKNOWN"}}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"payload":{}}"#,
            "\n",
            r#"{"event_type":"STARTUP"}"#,
            "\n",
        );
        let entries = parse_lines(content);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_type, INTENT_PARSED);
        assert_eq!(entries[1].event_type, "STARTUP");
    }

    #[tokio::test]
    async fn append_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileEventLog::new(dir.path().join("data").join("logs.jsonl"));

        log.append(&LogEntry::intent_parsed("hello", &Intent::unknown()))
            .await
            .unwrap();
        log.append(&LogEntry::intent_parsed("hello again", &Intent::unknown()))
            .await
            .unwrap();

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].as_intent_parsed().unwrap().text, "hello again");
    }

    #[tokio::test]
    async fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileEventLog::new(dir.path().join("none.jsonl"));
        assert!(log.read_all().await.unwrap().is_empty());
    }
}
