//! Event log sources.
//!
//! Delivery is at least once. Logs of one node arrive in order, logs of different nodes
//! may interleave out of position order. Sources therefore hand back logs in delivery
//! order from a cursor of their own; duplicates are the projector's problem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use crate::envelope::RawLog;
use crate::error::SourceError;

/// Logs read from one cursor, plus the cursor to continue from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delivery {
    pub logs: Vec<RawLog>,
    /// Equal to the requested cursor when nothing new was delivered
    pub next: u64,
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Up to `limit` deliveries starting at `cursor`, in delivery order.
    async fn fetch(&self, cursor: u64, limit: usize) -> Result<Delivery, SourceError>;
}

fn offset(cursor: u64) -> usize {
    usize::try_from(cursor).unwrap_or(usize::MAX)
}

/// Reads a JSON-lines file appended to by a chain follower. The cursor is a line number.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventSource for JsonLinesSource {
    async fn fetch(&self, cursor: u64, limit: usize) -> Result<Delivery, SourceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // Nothing written yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Delivery {
                    logs: Vec::new(),
                    next: cursor,
                })
            }
            Err(source) => {
                return Err(SourceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut logs = Vec::new();
        let mut next = cursor;
        for (index, line) in content
            .split_inclusive('\n')
            .enumerate()
            .skip(offset(cursor))
        {
            // The follower may still be writing the last line
            if logs.len() >= limit || !line.ends_with('\n') {
                break;
            }
            next = index as u64 + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawLog>(line) {
                Ok(log) => logs.push(log),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping unreadable log line"
                ),
            }
        }
        Ok(Delivery { logs, next })
    }
}

/// In-process source, fed by [`MemorySource::push`]. The cursor is an index into the pushes.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    logs: Arc<Mutex<Vec<RawLog>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, log: RawLog) {
        self.logs.lock().push(log);
    }

    pub fn extend(&self, logs: impl IntoIterator<Item = RawLog>) {
        self.logs.lock().extend(logs);
    }

    pub fn len(&self) -> usize {
        self.logs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.lock().is_empty()
    }
}

#[async_trait]
impl EventSource for MemorySource {
    async fn fetch(&self, cursor: u64, limit: usize) -> Result<Delivery, SourceError> {
        let logs = self.logs.lock();
        let start = offset(cursor).min(logs.len());
        let end = start.saturating_add(limit).min(logs.len());
        Ok(Delivery {
            logs: logs[start..end].to_vec(),
            next: end as u64,
        })
    }
}
