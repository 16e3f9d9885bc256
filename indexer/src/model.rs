//! Read model rows.
//!
//! Everything is keyed by node. A node's rows live together in one [`NodeState`] so a
//! reducer sees and replaces them as a unit.

use std::collections::BTreeMap;
use std::fmt;

use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};
use subnames::utils::{decode_node, encode_node};

use crate::envelope::{Checkpoint, DecodedLog, LogPosition};

/// Node hash, rendered as lowercase hex.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct NodeId(Vec<u8>);

impl NodeId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        encode_node(&self.0)
    }

    pub fn parse(s: &str) -> Result<Self, hex::FromHexError> {
        decode_node(s).map(NodeId)
    }

    /// Stable partition for `buckets` workers.
    pub fn bucket(&self, buckets: usize) -> usize {
        let prefix = self
            .0
            .iter()
            .take(8)
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        (prefix % buckets.max(1) as u64) as usize
    }
}

impl From<&[u8]> for NodeId {
    fn from(bytes: &[u8]) -> Self {
        NodeId(bytes.to_vec())
    }
}

impl From<Vec<u8>> for NodeId {
    fn from(bytes: Vec<u8>) -> Self {
        NodeId(bytes)
    }
}

impl From<NodeId> for String {
    fn from(node: NodeId) -> Self {
        node.to_hex()
    }
}

impl TryFrom<String> for NodeId {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        NodeId::parse(&s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NameRow {
    pub label: String,
    pub full_name: String,
    /// Last owner written by the ledger. Whether it is still in force depends on `expiry`.
    pub owner: Option<String>,
    pub expiry: u64,
    pub creation_block: u64,
    pub creation_tx: String,
}

impl NameRow {
    pub fn is_active(&self, now: u64) -> bool {
        self.owner.is_some() && now < self.expiry
    }

    pub fn active_owner(&self, now: u64) -> Option<&str> {
        if self.is_active(now) {
            self.owner.as_deref()
        } else {
            None
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AddressEntry {
    pub coin_type: u64,
    pub address: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TextEntry {
    pub key: String,
    pub value: String,
}

/// Resolver records of one node, in first-write order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordRow {
    pub addresses: Vec<AddressEntry>,
    pub texts: Vec<TextEntry>,
    pub contenthash: Option<Vec<u8>>,
}

impl RecordRow {
    pub fn set_address(&mut self, coin_type: u64, address: Vec<u8>) {
        upsert(
            &mut self.addresses,
            |entry| entry.coin_type == coin_type,
            AddressEntry { coin_type, address },
        );
    }

    pub fn set_text(&mut self, key: &str, value: &str) {
        upsert(
            &mut self.texts,
            |entry| entry.key == key,
            TextEntry {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn address(&self, coin_type: u64) -> Option<&[u8]> {
        self.addresses
            .iter()
            .find(|entry| entry.coin_type == coin_type)
            .map(|entry| entry.address.as_slice())
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }
}

/// Replace the entry matching `matches`, or append.
fn upsert<T>(entries: &mut Vec<T>, matches: impl Fn(&T) -> bool, entry: T) {
    match entries.iter_mut().find(|existing| matches(existing)) {
        Some(existing) => *existing = entry,
        None => entries.push(entry),
    }
}

/// Facts captured when a name was (re)registered.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationRow {
    pub label: String,
    pub owner: Option<String>,
    pub tx_hash: String,
    pub block_height: u64,
    /// Only known when a registrar controller reported the sale
    pub price: Option<Uint128>,
    pub payment_token: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeState {
    pub node: NodeId,
    pub name: Option<NameRow>,
    pub record: Option<RecordRow>,
    pub registration: Option<RegistrationRow>,
    /// Position of the newest event folded into this state
    pub last_applied: Option<LogPosition>,
}

impl NodeState {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            name: None,
            record: None,
            registration: None,
            last_applied: None,
        }
    }

    /// At or before the last applied position means already seen.
    pub fn has_applied(&self, position: LogPosition) -> bool {
        self.last_applied.map_or(false, |last| position <= last)
    }

    pub fn record_mut(&mut self) -> &mut RecordRow {
        self.record.get_or_insert_with(RecordRow::default)
    }
}

/// A node whose history stopped making sense; its events wait here for an operator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ParkedNode {
    pub node: NodeId,
    pub reason: String,
    pub pending: Vec<DecodedLog>,
}

/// Whole read model, also the on-disk snapshot format.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ReadModel {
    #[serde(default)]
    pub checkpoint: Checkpoint,
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, NodeState>,
    #[serde(default)]
    pub parked: BTreeMap<NodeId, ParkedNode>,
}
