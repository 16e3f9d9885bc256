//! Error types for the indexer

use std::path::PathBuf;

use subnames::events::EventKind;
use thiserror::Error;

use crate::model::NodeId;

/// Errors from a read-model store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend is temporarily unavailable; the same call may succeed later
    #[error("Transient store failure: {0}")]
    Transient(String),

    /// Persisted state could not be understood
    #[error("Corrupt store state: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_) | StoreError::Io(_))
    }
}

/// Errors reading the event log
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Event log unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A reducer refused an event because the node's history cannot explain it
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplyError {
    #[error("{kind} for node {node} that was never created")]
    UnknownNode { kind: EventKind, node: NodeId },
}

/// Errors from the projector
#[derive(Debug, Error)]
pub enum ProjectorError {
    /// Retried internally; surfaces only from single-shot calls
    #[error("Transient failure: {0}")]
    Transient(StoreError),

    #[error("Corrupt history: {0}")]
    Corruption(#[from] ApplyError),

    #[error("Projector cancelled by shutdown")]
    Cancelled,

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl From<StoreError> for ProjectorError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            ProjectorError::Transient(e)
        } else {
            ProjectorError::Store(e)
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors answering a gateway lookup
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Name {node} is not known to the read model")]
    UnknownName { node: NodeId },

    #[error("Name {node} is expired or revoked")]
    Inactive { node: NodeId },

    #[error("Signing failed: {0}")]
    Signer(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
