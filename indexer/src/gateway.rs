//! Resolution gateway.
//!
//! Answers an off-chain lookup from the read model and binds the answer to a digest the
//! configured [`Signer`] attests. How keys are held and how the attestation travels on
//! the wire is the signer's business.

use std::sync::Arc;

use serde::Serialize;
use subnames::utils::keccak256;
use tracing::debug;

use crate::envelope::LogPosition;
use crate::error::GatewayError;
use crate::model::NodeId;
use crate::query::{NameFilter, QueryApi};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordQuery {
    Address { coin_type: u64 },
    Text { key: String },
    Contenthash,
}

impl RecordQuery {
    /// Unambiguous byte form used inside the digest.
    fn encode(&self) -> Vec<u8> {
        match self {
            RecordQuery::Address { coin_type } => {
                let mut out = vec![0u8];
                out.extend_from_slice(&coin_type.to_be_bytes());
                out
            }
            RecordQuery::Text { key } => {
                let mut out = vec![1u8];
                out.extend_from_slice(&(key.len() as u64).to_be_bytes());
                out.extend_from_slice(key.as_bytes());
                out
            }
            RecordQuery::Contenthash => vec![2u8],
        }
    }
}

pub trait Signer: Send + Sync {
    /// Identifier bound into every digest this signer attests.
    fn id(&self) -> &str;

    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attestation {
    pub signer: String,
    pub digest: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub node: NodeId,
    pub query: RecordQuery,
    /// Raw record bytes; text records are UTF-8
    pub value: Option<Vec<u8>>,
    /// Read model position the answer was taken from
    pub position: Option<LogPosition>,
    /// Unix seconds after which the answer must not be trusted
    pub valid_until: u64,
    pub attestation: Attestation,
}

pub fn digest(
    node: &NodeId,
    query: &RecordQuery,
    value: Option<&[u8]>,
    valid_until: u64,
    signer: &str,
) -> Vec<u8> {
    let mut preimage = Vec::new();
    preimage.extend_from_slice(node.as_bytes());
    preimage.extend_from_slice(&query.encode());
    match value {
        Some(value) => {
            preimage.push(1);
            preimage.extend_from_slice(&(value.len() as u64).to_be_bytes());
            preimage.extend_from_slice(value);
        }
        None => preimage.push(0),
    }
    preimage.extend_from_slice(&valid_until.to_be_bytes());
    preimage.extend_from_slice(signer.as_bytes());
    keccak256(&preimage)
}

pub struct Gateway {
    query: QueryApi,
    signer: Arc<dyn Signer>,
    ttl_secs: u64,
}

impl Gateway {
    pub fn new(query: QueryApi, signer: Arc<dyn Signer>, ttl_secs: u64) -> Self {
        Self {
            query,
            signer,
            ttl_secs,
        }
    }

    /// Only active names resolve. Validity never outlives the name itself.
    pub async fn resolve(
        &self,
        node: &NodeId,
        query: RecordQuery,
        now: u64,
    ) -> Result<Resolution, GatewayError> {
        let position = self.query.position().await?;
        let name = match self.query.by_node(node, NameFilter::all_at(now)).await? {
            Some(name) => name,
            None => return Err(GatewayError::UnknownName { node: node.clone() }),
        };
        if !name.active {
            return Err(GatewayError::Inactive { node: node.clone() });
        }

        let record = self.query.records(node).await?.unwrap_or_default();
        let value = match &query {
            RecordQuery::Address { coin_type } => record.address(*coin_type).map(<[u8]>::to_vec),
            RecordQuery::Text { key } => record.text(key).map(|text| text.as_bytes().to_vec()),
            RecordQuery::Contenthash => record.contenthash.clone(),
        };

        let valid_until = now.saturating_add(self.ttl_secs).min(name.expiry);
        let digest = digest(
            node,
            &query,
            value.as_deref(),
            valid_until,
            self.signer.id(),
        );
        let signature = self.signer.sign(&digest)?;
        debug!(node = %node, ?query, valid_until, "Resolved record");

        Ok(Resolution {
            node: node.clone(),
            query,
            value,
            position,
            valid_until,
            attestation: Attestation {
                signer: self.signer.id().to_string(),
                digest,
                signature,
            },
        })
    }
}
