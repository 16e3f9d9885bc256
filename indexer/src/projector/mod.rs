//! Event projector
//!
//! Folds the registry's event log into the read model.
//!
//! - Each batch is split by node across `workers` tokio tasks. A worker applies its queue
//!   in log order, so events of one node never race.
//! - Every node state remembers the last position folded into it; anything at or before
//!   that position is a duplicate delivery and is ignored.
//! - Events that do not decode are logged and skipped.
//! - The source is read by delivery cursor, not by position, so a log that arrives after
//!   a later log of another node has been committed is still applied.
//! - Transient store failures are retried with backoff. The checkpoint only moves once
//!   the whole batch has been applied.
//! - A lifecycle event for a node that was never created raises an alarm and parks the
//!   node. Its later events queue up behind it instead of being applied or dropped.
//! - Shutdown is a `watch` channel flipped to `true`; it also interrupts backoff sleeps.

pub mod dispatch;
pub mod retry;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ProjectorConfig;
use crate::envelope::{Checkpoint, DecodedLog, LogPosition, RawLog};
use crate::error::ProjectorError;
use crate::model::NodeState;
use crate::source::{Delivery, EventSource};
use crate::store::ReadModelStore;

pub use dispatch::{reducer_for, ApplyContext, Reducer, DISPATCH};
pub use retry::{Retries, RetryPolicy};

/// What happened to a single log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// Already folded into the node's state
    Duplicate,
    /// Queued behind a parked node
    Parked,
    /// Decoded, but nothing knows how to fold it
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectorStats {
    pub applied: u64,
    pub duplicates: u64,
    pub skipped: u64,
    pub parked: u64,
    pub retries: u64,
    pub batches: u64,
}

#[derive(Debug, Default)]
struct Counters {
    applied: AtomicU64,
    duplicates: AtomicU64,
    skipped: AtomicU64,
    parked: AtomicU64,
    retries: AtomicU64,
    batches: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record(&self, applied: Applied) {
        match applied {
            Applied::Applied => Self::bump(&self.applied),
            Applied::Duplicate => Self::bump(&self.duplicates),
            Applied::Parked => Self::bump(&self.parked),
            Applied::Skipped => Self::bump(&self.skipped),
        }
    }

    fn snapshot(&self) -> ProjectorStats {
        ProjectorStats {
            applied: self.applied.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            parked: self.parked.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }
}

fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Resolves once the flag reads `true`. A dropped sender never signals.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        let stop = *shutdown.borrow_and_update();
        if stop {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Sleeps for `delay`; returns `true` if shutdown was requested first.
async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = wait_for_shutdown(shutdown) => true,
    }
}

/// Everything a worker task needs, cheap to clone.
#[derive(Clone)]
struct Applier {
    store: Arc<dyn ReadModelStore>,
    root_name: Arc<str>,
    retry: RetryPolicy,
    counters: Arc<Counters>,
    shutdown: watch::Receiver<bool>,
}

impl Applier {
    async fn reduce(&self, log: &DecodedLog) -> Result<Applied, ProjectorError> {
        let node = log.node();
        let state = self
            .store
            .load_node(&node)
            .await?
            .unwrap_or_else(|| NodeState::new(node.clone()));
        if state.has_applied(log.position) {
            return Ok(Applied::Duplicate);
        }

        let kind = log.event.kind();
        let reducer = match reducer_for(kind) {
            Some(reducer) => reducer,
            None => {
                warn!(%kind, position = %log.position, "No reducer registered, skipping");
                return Ok(Applied::Skipped);
            }
        };
        let ctx = ApplyContext {
            position: log.position,
            tx_hash: &log.tx_hash,
            root_name: &self.root_name,
        };
        let mut next = reducer(state, &log.event, &ctx)?;
        next.last_applied = Some(log.position);
        self.store.save_node(next).await?;
        debug!(node = %node, %kind, position = %log.position, "Applied event");
        Ok(Applied::Applied)
    }

    async fn apply_one(&self, log: &DecodedLog) -> Result<Applied, ProjectorError> {
        let node = log.node();
        if let Some(parked) = self.store.parked(&node).await? {
            self.store.park(&node, &parked.reason, log.clone()).await?;
            debug!(node = %node, position = %log.position, "Queued event behind parked node");
            return Ok(Applied::Parked);
        }

        match self.reduce(log).await {
            Err(ProjectorError::Corruption(e)) => {
                let reason = e.to_string();
                error!(
                    target: "alarm",
                    node = %node,
                    kind = %log.event.kind(),
                    position = %log.position,
                    tx_hash = %log.tx_hash,
                    reason = %reason,
                    "Parking node: event history cannot be explained"
                );
                self.store.park(&node, &reason, log.clone()).await?;
                Ok(Applied::Parked)
            }
            other => other,
        }
    }

    async fn apply_with_retry(&self, log: &DecodedLog) -> Result<Applied, ProjectorError> {
        let mut retries = self.retry.start();
        let mut shutdown = self.shutdown.clone();
        loop {
            match self.apply_one(log).await {
                Err(ProjectorError::Transient(e)) => {
                    Counters::bump(&self.counters.retries);
                    let delay = retries.next_delay();
                    warn!(
                        position = %log.position,
                        attempt = retries.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient store failure, retrying"
                    );
                    if sleep_or_shutdown(delay, &mut shutdown).await {
                        return Err(ProjectorError::Cancelled);
                    }
                }
                other => return other,
            }
        }
    }

    async fn run_queue(self, queue: Vec<DecodedLog>) -> Result<(), ProjectorError> {
        for log in queue.iter() {
            if is_shutdown(&self.shutdown) {
                return Err(ProjectorError::Cancelled);
            }
            let applied = self.apply_with_retry(log).await?;
            self.counters.record(applied);
        }
        Ok(())
    }
}

pub struct Projector {
    store: Arc<dyn ReadModelStore>,
    source: Arc<dyn EventSource>,
    config: ProjectorConfig,
    shutdown: watch::Receiver<bool>,
    counters: Arc<Counters>,
}

impl Projector {
    pub fn new(
        store: Arc<dyn ReadModelStore>,
        source: Arc<dyn EventSource>,
        config: ProjectorConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            source,
            config,
            shutdown,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn stats(&self) -> ProjectorStats {
        self.counters.snapshot()
    }

    fn applier(&self) -> Applier {
        Applier {
            store: self.store.clone(),
            root_name: Arc::from(self.config.root_name.as_str()),
            retry: RetryPolicy::from_config(&self.config),
            counters: self.counters.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Applies one decoded log without retrying. Does not touch the checkpoint.
    pub async fn apply_one(&self, log: &DecodedLog) -> Result<Applied, ProjectorError> {
        let applied = self.applier().apply_one(log).await?;
        self.counters.record(applied);
        Ok(applied)
    }

    /// Applies a batch without committing anything. Returns the highest position in it.
    pub async fn apply_batch(
        &self,
        mut logs: Vec<RawLog>,
    ) -> Result<Option<LogPosition>, ProjectorError> {
        // Stable, so a node's own logs keep their delivery order on equal positions
        logs.sort_by_key(RawLog::position);
        let highest = match logs.last() {
            Some(log) => log.position(),
            None => return Ok(None),
        };

        let workers = self.config.workers.max(1);
        let mut queues: Vec<Vec<DecodedLog>> = vec![Vec::new(); workers];
        for raw in logs.iter() {
            match raw.decode() {
                Ok(log) => queues[log.node().bucket(workers)].push(log),
                Err(e) => {
                    Counters::bump(&self.counters.skipped);
                    warn!(
                        position = %raw.position(),
                        tx_hash = %raw.tx_hash,
                        event_type = %raw.event.ty,
                        error = %e,
                        "Skipping malformed event"
                    );
                }
            }
        }

        let mut tasks = JoinSet::new();
        for queue in queues.into_iter().filter(|queue| !queue.is_empty()) {
            tasks.spawn(self.applier().run_queue(queue));
        }
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|e| ProjectorError::Worker(e.to_string()))
                .and_then(|result| result);
            if let Err(e) = result {
                failure.get_or_insert(e);
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(Some(highest)),
        }
    }

    /// Applies one delivery and commits the cursor after it. On error nothing is
    /// committed and the same delivery is fetched again. `None` when the source had
    /// nothing new.
    pub async fn process_delivery(
        &self,
        checkpoint: Checkpoint,
        delivery: Delivery,
    ) -> Result<Option<Checkpoint>, ProjectorError> {
        if delivery.next <= checkpoint.cursor {
            return Ok(None);
        }
        let logs = delivery.logs.len();
        let highest = self.apply_batch(delivery.logs).await?;
        let next = checkpoint.advance(delivery.next, highest);
        self.commit_with_retry(next).await?;
        Counters::bump(&self.counters.batches);
        debug!(checkpoint = %next, logs, "Committed batch");
        Ok(Some(next))
    }

    async fn commit_with_retry(&self, checkpoint: Checkpoint) -> Result<(), ProjectorError> {
        let mut retries = RetryPolicy::from_config(&self.config).start();
        let mut shutdown = self.shutdown.clone();
        loop {
            match self.store.commit_checkpoint(checkpoint).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() => {
                    Counters::bump(&self.counters.retries);
                    let delay = retries.next_delay();
                    warn!(checkpoint = %checkpoint, error = %e, "Checkpoint commit failed, retrying");
                    if sleep_or_shutdown(delay, &mut shutdown).await {
                        return Err(ProjectorError::Cancelled);
                    }
                }
                Err(e) => return Err(ProjectorError::Store(e)),
            }
        }
    }

    /// Drains the source from the committed checkpoint and returns once it has nothing new.
    pub async fn catch_up(&self) -> Result<ProjectorStats, ProjectorError> {
        let mut checkpoint = self.store.checkpoint().await?;
        loop {
            if is_shutdown(&self.shutdown) {
                return Err(ProjectorError::Cancelled);
            }
            let delivery = self
                .source
                .fetch(checkpoint.cursor, self.config.batch_size)
                .await?;
            match self.process_delivery(checkpoint, delivery).await? {
                Some(next) => checkpoint = next,
                None => return Ok(self.stats()),
            }
        }
    }

    /// Follows the source until shutdown.
    pub async fn run(&self) -> Result<ProjectorStats, ProjectorError> {
        let mut shutdown = self.shutdown.clone();
        let mut checkpoint = self.store.checkpoint().await?;
        let mut source_retries = RetryPolicy::from_config(&self.config).start();
        info!(
            checkpoint = %checkpoint,
            workers = self.config.workers,
            batch_size = self.config.batch_size,
            "Projector started"
        );

        loop {
            if is_shutdown(&shutdown) {
                break;
            }
            let delivery = match self
                .source
                .fetch(checkpoint.cursor, self.config.batch_size)
                .await
            {
                Ok(delivery) => {
                    source_retries.reset();
                    delivery
                }
                Err(e) => {
                    let delay = source_retries.next_delay();
                    warn!(
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Event source unavailable"
                    );
                    if sleep_or_shutdown(delay, &mut shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            match self.process_delivery(checkpoint, delivery).await {
                Ok(Some(next)) => checkpoint = next,
                Ok(None) => {
                    if sleep_or_shutdown(self.config.poll_interval(), &mut shutdown).await {
                        break;
                    }
                }
                Err(ProjectorError::Cancelled) => break,
                Err(e) => return Err(e),
            }
        }

        let stats = self.stats();
        info!(
            checkpoint = %checkpoint,
            applied = stats.applied,
            duplicates = stats.duplicates,
            skipped = stats.skipped,
            parked = stats.parked,
            "Projector stopped"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::{NodeId, ParkedNode, ReadModel};
    use crate::source::MemorySource;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use cosmwasm_std::{Addr, Event};
    use std::sync::atomic::AtomicUsize;
    use subnames::events::LedgerEvent;
    use subnames::utils::namehash;

    /// Fails the first `failures` saves with a transient error
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicUsize,
    }

    impl FlakyStore {
        fn new(failures: usize) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures: AtomicUsize::new(failures),
            }
        }
    }

    #[async_trait]
    impl ReadModelStore for FlakyStore {
        async fn load_node(&self, node: &NodeId) -> Result<Option<NodeState>, StoreError> {
            self.inner.load_node(node).await
        }

        async fn save_node(&self, state: NodeState) -> Result<(), StoreError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Transient(String::from("backend busy")));
            }
            self.inner.save_node(state).await
        }

        async fn checkpoint(&self) -> Result<Checkpoint, StoreError> {
            self.inner.checkpoint().await
        }

        async fn commit_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StoreError> {
            self.inner.commit_checkpoint(checkpoint).await
        }

        async fn parked(&self, node: &NodeId) -> Result<Option<ParkedNode>, StoreError> {
            self.inner.parked(node).await
        }

        async fn park(
            &self,
            node: &NodeId,
            reason: &str,
            log: DecodedLog,
        ) -> Result<(), StoreError> {
            self.inner.park(node, reason, log).await
        }

        async fn snapshot(&self) -> Result<ReadModel, StoreError> {
            self.inner.snapshot().await
        }
    }

    fn config() -> ProjectorConfig {
        ProjectorConfig {
            root_name: String::from("celo.eth"),
            workers: 3,
            batch_size: 4,
            poll_interval_ms: 10,
            backoff_base_ms: 1,
            backoff_max_ms: 5,
        }
    }

    fn node(label: &str) -> Vec<u8> {
        namehash(&format!("{}.celo.eth", label))
    }

    fn raw(height: u64, index: u32, event: LedgerEvent) -> RawLog {
        RawLog::new(
            LogPosition::new(height, index),
            format!("tx{}", height),
            event.to_event(),
        )
    }

    fn created(height: u64, label: &str, owner: &str) -> RawLog {
        raw(
            height,
            0,
            LedgerEvent::NameCreated {
                node: node(label),
                label: String::from(label),
                owner: Addr::unchecked(owner),
                expiry: 1_000,
            },
        )
    }

    fn text(height: u64, label: &str, value: &str) -> RawLog {
        raw(
            height,
            1,
            LedgerEvent::TextChanged {
                node: node(label),
                key: String::from("url"),
                value: String::from(value),
            },
        )
    }

    fn projector(
        store: Arc<dyn ReadModelStore>,
        source: &MemorySource,
        shutdown: watch::Receiver<bool>,
    ) -> Projector {
        Projector::new(store, Arc::new(source.clone()), config(), shutdown)
    }

    async fn load(store: &dyn ReadModelStore, label: &str) -> NodeState {
        store
            .load_node(&NodeId::from(node(label)))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_catch_up_across_batches() {
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(MemoryStore::new());
        let source = MemorySource::new();
        for (height, label) in ["alice", "bob", "carol", "dave", "erin"].iter().enumerate() {
            let height = height as u64 + 1;
            source.push(created(height, label, label));
            source.push(text(height, label, label));
        }

        let projector = projector(store.clone(), &source, rx);
        let stats = projector.catch_up().await.unwrap();

        assert_eq!(stats.applied, 10);
        assert_eq!(stats.batches, 3);
        let checkpoint = store.checkpoint().await.unwrap();
        assert_eq!(checkpoint.cursor, 10);
        assert_eq!(checkpoint.position, Some(LogPosition::new(5, 1)));
        let erin = load(store.as_ref(), "erin").await;
        assert_eq!(erin.name.unwrap().full_name, "erin.celo.eth");
        assert_eq!(erin.record.unwrap().text("url"), Some("erin"));
        assert_eq!(erin.last_applied, Some(LogPosition::new(5, 1)));
    }

    #[tokio::test]
    async fn test_redelivery_is_a_no_op() {
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(MemoryStore::new());
        let source = MemorySource::new();
        let projector = projector(store.clone(), &source, rx);

        let batch = vec![
            created(1, "alice", "alice"),
            text(2, "alice", "first"),
            text(3, "alice", "second"),
        ];
        projector.apply_batch(batch.clone()).await.unwrap();
        let before = load(store.as_ref(), "alice").await;

        // Same logs again, plus an older one arriving late
        projector.apply_batch(batch).await.unwrap();
        projector
            .apply_batch(vec![text(2, "alice", "first")])
            .await
            .unwrap();

        assert_eq!(load(store.as_ref(), "alice").await, before);
        let stats = projector.stats();
        assert_eq!(stats.applied, 3);
        assert_eq!(stats.duplicates, 4);
        assert_eq!(before.record.unwrap().text("url"), Some("second"));
    }

    #[tokio::test]
    async fn test_malformed_events_are_skipped() {
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(MemoryStore::new());
        let source = MemorySource::new();
        source.push(created(1, "alice", "alice"));
        source.push(RawLog::new(
            LogPosition::new(2, 0),
            "tx2",
            Event::new("wasm-text_changed").add_attribute("node", "zz"),
        ));
        source.push(RawLog::new(
            LogPosition::new(3, 0),
            "tx3",
            Event::new("wasm-unrelated"),
        ));
        source.push(text(4, "alice", "ok"));

        let projector = projector(store.clone(), &source, rx);
        let stats = projector.catch_up().await.unwrap();

        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.applied, 2);
        assert_eq!(stats.duplicates, 0);
        let checkpoint = store.checkpoint().await.unwrap();
        assert_eq!(checkpoint.cursor, 4);
        assert_eq!(checkpoint.position, Some(LogPosition::new(4, 1)));
    }

    #[tokio::test]
    async fn test_unknown_node_is_parked() {
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(MemoryStore::new());
        let source = MemorySource::new();
        source.push(raw(
            1,
            0,
            LedgerEvent::Transferred {
                node: node("ghost"),
                from: Addr::unchecked("alice"),
                to: Addr::unchecked("bob"),
            },
        ));
        source.push(text(2, "ghost", "later"));
        source.push(created(3, "alice", "alice"));

        let projector = projector(store.clone(), &source, rx);
        let stats = projector.catch_up().await.unwrap();
        assert_eq!(stats.parked, 2);
        assert_eq!(stats.applied, 1);

        let ghost = NodeId::from(node("ghost"));
        let parked = store.parked(&ghost).await.unwrap().unwrap();
        assert_eq!(parked.pending.len(), 2);
        assert!(parked.reason.contains("transferred"));
        assert_eq!(store.load_node(&ghost).await.unwrap(), None);

        // The rest of the log keeps flowing
        assert_eq!(
            store.checkpoint().await.unwrap().position,
            Some(LogPosition::new(3, 0))
        );
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(FlakyStore::new(3));
        let source = MemorySource::new();
        source.push(created(1, "alice", "alice"));

        let projector = projector(store.clone(), &source, rx);
        let stats = projector.catch_up().await.unwrap();

        assert_eq!(stats.retries, 3);
        assert_eq!(stats.applied, 1);
        assert!(load(store.as_ref(), "alice").await.name.is_some());
    }

    #[tokio::test]
    async fn test_single_shot_apply_surfaces_transient_errors() {
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(FlakyStore::new(1));
        let source = MemorySource::new();
        let projector = projector(store.clone(), &source, rx);

        let log = created(1, "alice", "alice").decode().unwrap();
        let err = projector.apply_one(&log).await.unwrap_err();
        assert!(matches!(err, ProjectorError::Transient(_)));
        assert_eq!(projector.apply_one(&log).await.unwrap(), Applied::Applied);
        assert_eq!(projector.apply_one(&log).await.unwrap(), Applied::Duplicate);
        assert_eq!(store.checkpoint().await.unwrap(), Checkpoint::default());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_backoff_without_commit() {
        let (tx, rx) = watch::channel(false);
        let store = Arc::new(FlakyStore::new(usize::MAX));
        let source = MemorySource::new();
        source.push(created(1, "alice", "alice"));

        let mut config = config();
        config.backoff_base_ms = 60_000;
        config.backoff_max_ms = 60_000;
        let projector = Projector::new(store.clone(), Arc::new(source), config, rx);

        let handle = tokio::spawn(async move { projector.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(stats.applied, 0);
        assert!(stats.retries >= 1);
        assert_eq!(store.checkpoint().await.unwrap(), Checkpoint::default());
    }

    #[tokio::test]
    async fn test_restart_resumes_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let source = MemorySource::new();
        source.push(created(1, "alice", "alice"));
        source.push(text(2, "alice", "first"));

        {
            let (_tx, rx) = watch::channel(false);
            let store = Arc::new(MemoryStore::open(&path).await.unwrap());
            let projector = projector(store, &source, rx);
            assert_eq!(projector.catch_up().await.unwrap().applied, 2);
        }

        source.push(text(3, "alice", "second"));
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(MemoryStore::open(&path).await.unwrap());
        let projector = projector(store.clone(), &source, rx);
        let stats = projector.catch_up().await.unwrap();

        assert_eq!(stats.applied, 1);
        assert_eq!(stats.duplicates, 0);
        let alice = load(store.as_ref(), "alice").await;
        assert_eq!(alice.record.unwrap().text("url"), Some("second"));
    }

    #[tokio::test]
    async fn test_late_log_for_another_node_is_still_applied() {
        let (_tx, rx) = watch::channel(false);
        let store = Arc::new(MemoryStore::new());
        let source = MemorySource::new();
        let projector = projector(store.clone(), &source, rx);

        source.push(created(5, "alice", "alice"));
        projector.catch_up().await.unwrap();
        assert_eq!(
            store.checkpoint().await.unwrap().position,
            Some(LogPosition::new(5, 0))
        );

        // Bob's registration was mined earlier but reaches us only now
        source.push(created(3, "bob", "bob"));
        source.push(text(4, "bob", "https://bob.example"));
        let stats = projector.catch_up().await.unwrap();

        assert_eq!(stats.applied, 3);
        assert_eq!(stats.duplicates, 0);
        let bob = load(store.as_ref(), "bob").await;
        assert_eq!(bob.name.unwrap().owner.as_deref(), Some("bob"));
        assert_eq!(
            bob.record.unwrap().text("url"),
            Some("https://bob.example")
        );

        let checkpoint = store.checkpoint().await.unwrap();
        assert_eq!(checkpoint.cursor, 3);
        assert_eq!(checkpoint.position, Some(LogPosition::new(5, 0)));
    }

    #[test]
    fn test_unfoldable_events_count_as_skipped() {
        let counters = Counters::default();
        counters.record(Applied::Skipped);
        counters.record(Applied::Duplicate);

        let stats = counters.snapshot();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.applied, 0);
    }
}
