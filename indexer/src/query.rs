//! Read-only queries over the projected model.
//!
//! Every call works on one store snapshot, so a single answer never mixes two
//! checkpoints.

use std::sync::Arc;

use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};

use crate::envelope::LogPosition;
use crate::error::StoreError;
use crate::model::{NameRow, NodeId, NodeState, ReadModel, RecordRow};
use crate::store::ReadModelStore;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameFilter {
    /// Keep only names with `expiry > now` and an owner
    pub active_only: bool,
    /// Unix seconds used for the active check
    pub now: u64,
    /// By creation block, then node
    pub order: SortOrder,
}

impl NameFilter {
    pub fn active_at(now: u64) -> Self {
        Self {
            active_only: true,
            now,
            order: SortOrder::Ascending,
        }
    }

    pub fn all_at(now: u64) -> Self {
        Self {
            active_only: false,
            now,
            order: SortOrder::Ascending,
        }
    }

    fn accepts(&self, name: &NameRow) -> bool {
        !self.active_only || name.is_active(self.now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Zero means the default; anything above the cap is clamped.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_PAGE_SIZE,
            limit => limit.min(MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// Matches before paging
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationView {
    pub tx_hash: String,
    pub block_height: u64,
    pub price: Option<Uint128>,
    pub payment_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameView {
    pub node: NodeId,
    pub label: String,
    pub full_name: String,
    /// Owner as last recorded, in force only while `active`
    pub owner: Option<String>,
    pub expiry: u64,
    pub active: bool,
    pub creation_block: u64,
    pub creation_tx: String,
    pub registration: Option<RegistrationView>,
}

impl NameView {
    fn from_state(state: &NodeState, name: &NameRow, now: u64) -> Self {
        Self {
            node: state.node.clone(),
            label: name.label.clone(),
            full_name: name.full_name.clone(),
            owner: name.owner.clone(),
            expiry: name.expiry,
            active: name.is_active(now),
            creation_block: name.creation_block,
            creation_tx: name.creation_tx.clone(),
            registration: state.registration.as_ref().map(|registration| RegistrationView {
                tx_hash: registration.tx_hash.clone(),
                block_height: registration.block_height,
                price: registration.price,
                payment_token: registration.payment_token.clone(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct QueryApi {
    store: Arc<dyn ReadModelStore>,
}

impl QueryApi {
    pub fn new(store: Arc<dyn ReadModelStore>) -> Self {
        Self { store }
    }

    /// Highest log position folded into the last committed checkpoint.
    pub async fn position(&self) -> Result<Option<LogPosition>, StoreError> {
        Ok(self.store.checkpoint().await?.position)
    }

    pub async fn by_node(
        &self,
        node: &NodeId,
        filter: NameFilter,
    ) -> Result<Option<NameView>, StoreError> {
        let model = self.store.snapshot().await?;
        Ok(model.nodes.get(node).and_then(|state| {
            let name = state.name.as_ref()?;
            filter
                .accepts(name)
                .then(|| NameView::from_state(state, name, filter.now))
        }))
    }

    pub async fn by_owner(
        &self,
        owner: &str,
        filter: NameFilter,
        page: Page,
    ) -> Result<PageResult<NameView>, StoreError> {
        let model = self.store.snapshot().await?;
        Ok(select(&model, filter, page, |name| {
            name.owner.as_deref() == Some(owner)
        }))
    }

    /// Substring match on the label.
    pub async fn by_label(
        &self,
        fragment: &str,
        filter: NameFilter,
        page: Page,
    ) -> Result<PageResult<NameView>, StoreError> {
        let model = self.store.snapshot().await?;
        Ok(select(&model, filter, page, |name| {
            name.label.contains(fragment)
        }))
    }

    pub async fn names(
        &self,
        filter: NameFilter,
        page: Page,
    ) -> Result<PageResult<NameView>, StoreError> {
        let model = self.store.snapshot().await?;
        Ok(select(&model, filter, page, |_| true))
    }

    /// Resolver records, whether or not the name is active.
    pub async fn records(&self, node: &NodeId) -> Result<Option<RecordRow>, StoreError> {
        let model = self.store.snapshot().await?;
        Ok(model.nodes.get(node).and_then(|state| state.record.clone()))
    }
}

fn select(
    model: &ReadModel,
    filter: NameFilter,
    page: Page,
    matches: impl Fn(&NameRow) -> bool,
) -> PageResult<NameView> {
    let mut hits: Vec<(&NodeState, &NameRow)> = model
        .nodes
        .values()
        .filter_map(|state| state.name.as_ref().map(|name| (state, name)))
        .filter(|(_, name)| filter.accepts(*name) && matches(*name))
        .collect();

    hits.sort_by(|(a_state, a), (b_state, b)| {
        a.creation_block
            .cmp(&b.creation_block)
            .then_with(|| a_state.node.cmp(&b_state.node))
    });
    if filter.order == SortOrder::Descending {
        hits.reverse();
    }

    let limit = page.effective_limit();
    let total = hits.len();
    let items = hits
        .into_iter()
        .skip(page.offset)
        .take(limit)
        .map(|(state, name)| NameView::from_state(state, name, filter.now))
        .collect();
    PageResult {
        items,
        total,
        offset: page.offset,
        limit,
    }
}
