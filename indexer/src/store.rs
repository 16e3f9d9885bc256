//! Read-model storage.
//!
//! The projector only talks to [`ReadModelStore`]. [`MemoryStore`] keeps the model in
//! memory and, when given a path, writes a JSON snapshot every time a checkpoint is
//! committed so a restart picks up where the last full batch ended.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::envelope::{Checkpoint, DecodedLog};
use crate::error::StoreError;
use crate::model::{NodeId, NodeState, ParkedNode, ReadModel};

#[async_trait]
pub trait ReadModelStore: Send + Sync {
    async fn load_node(&self, node: &NodeId) -> Result<Option<NodeState>, StoreError>;

    async fn save_node(&self, state: NodeState) -> Result<(), StoreError>;

    async fn checkpoint(&self) -> Result<Checkpoint, StoreError>;

    /// Records that every delivery before `checkpoint.cursor` has been applied.
    async fn commit_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StoreError>;

    async fn parked(&self, node: &NodeId) -> Result<Option<ParkedNode>, StoreError>;

    /// Appends `log` to the node's parked queue, creating the queue with `reason` if needed.
    async fn park(&self, node: &NodeId, reason: &str, log: DecodedLog) -> Result<(), StoreError>;

    /// Consistent copy of the whole model for readers.
    async fn snapshot(&self) -> Result<ReadModel, StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    model: Arc<RwLock<ReadModel>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the snapshot at `path` if there is one; later commits write back to it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let model = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let model: ReadModel = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?;
                info!(
                    path = %path.display(),
                    nodes = model.nodes.len(),
                    checkpoint = %model.checkpoint,
                    "Loaded read model snapshot"
                );
                model
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ReadModel::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            model: Arc::new(RwLock::new(model)),
            snapshot_path: Some(path),
        })
    }

    pub fn from_model(model: ReadModel) -> Self {
        Self {
            model: Arc::new(RwLock::new(model)),
            snapshot_path: None,
        }
    }

    async fn persist(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = {
            let model = self.model.read();
            serde_json::to_vec_pretty(&*model)?
        };
        // Write aside then rename so a crash never leaves half a snapshot
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Persisted snapshot");
        Ok(())
    }
}

#[async_trait]
impl ReadModelStore for MemoryStore {
    async fn load_node(&self, node: &NodeId) -> Result<Option<NodeState>, StoreError> {
        Ok(self.model.read().nodes.get(node).cloned())
    }

    async fn save_node(&self, state: NodeState) -> Result<(), StoreError> {
        self.model.write().nodes.insert(state.node.clone(), state);
        Ok(())
    }

    async fn checkpoint(&self) -> Result<Checkpoint, StoreError> {
        Ok(self.model.read().checkpoint)
    }

    async fn commit_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StoreError> {
        {
            let mut model = self.model.write();
            if checkpoint.cursor <= model.checkpoint.cursor {
                return Ok(());
            }
            model.checkpoint = checkpoint;
        }
        if let Some(path) = &self.snapshot_path {
            self.persist(path).await?;
        }
        Ok(())
    }

    async fn parked(&self, node: &NodeId) -> Result<Option<ParkedNode>, StoreError> {
        Ok(self.model.read().parked.get(node).cloned())
    }

    async fn park(&self, node: &NodeId, reason: &str, log: DecodedLog) -> Result<(), StoreError> {
        let mut model = self.model.write();
        let parked = model
            .parked
            .entry(node.clone())
            .or_insert_with(|| ParkedNode {
                node: node.clone(),
                reason: reason.to_string(),
                pending: Vec::new(),
            });
        // Redelivered logs are already queued
        if !parked
            .pending
            .iter()
            .any(|queued| queued.position == log.position)
        {
            parked.pending.push(log);
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<ReadModel, StoreError> {
        Ok(self.model.read().clone())
    }
}
