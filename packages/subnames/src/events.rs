//! Typed domain events.
//!
//! The registry contract turns every mutation into one of these and attaches it to the
//! response as a custom event; the indexer parses the same events back out of the chain
//! log. Keeping both directions here means the wire shape has a single definition.

use std::fmt;

use cosmwasm_std::{Addr, Attribute, Event, Uint128};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::{decode_node, encode_node};

/// Chains prefix custom contract events with this marker.
const WASM_PREFIX: &str = "wasm-";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NameCreated,
    ExpiryUpdated,
    NameRevoked,
    Transferred,
    TextChanged,
    AddrChanged,
    AddressChanged,
    ContenthashChanged,
    NameRegistered,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::NameCreated,
        EventKind::ExpiryUpdated,
        EventKind::NameRevoked,
        EventKind::Transferred,
        EventKind::TextChanged,
        EventKind::AddrChanged,
        EventKind::AddressChanged,
        EventKind::ContenthashChanged,
        EventKind::NameRegistered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NameCreated => "name_created",
            EventKind::ExpiryUpdated => "expiry_updated",
            EventKind::NameRevoked => "name_revoked",
            EventKind::Transferred => "transferred",
            EventKind::TextChanged => "text_changed",
            EventKind::AddrChanged => "addr_changed",
            EventKind::AddressChanged => "address_changed",
            EventKind::ContenthashChanged => "contenthash_changed",
            EventKind::NameRegistered => "name_registered",
        }
    }

    /// Accepts both the bare type and the `wasm-` prefixed form seen in chain logs.
    pub fn from_event_type(ty: &str) -> Option<EventKind> {
        let ty = ty.strip_prefix(WASM_PREFIX).unwrap_or(ty);
        EventKind::ALL.iter().copied().find(|kind| kind.as_str() == ty)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum EventError {
    #[error("UnknownEventType: {ty}")]
    UnknownType { ty: String },

    #[error("MissingAttribute: {kind} has no `{key}`")]
    MissingAttribute { kind: EventKind, key: String },

    #[error("InvalidAttribute: {kind}.{key} = {value:?}")]
    InvalidAttribute {
        kind: EventKind,
        key: String,
        value: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    NameCreated {
        node: Vec<u8>,
        label: String,
        owner: Addr,
        expiry: u64,
    },
    ExpiryUpdated {
        node: Vec<u8>,
        expiry: u64,
    },
    NameRevoked {
        node: Vec<u8>,
        admin: Addr,
    },
    Transferred {
        node: Vec<u8>,
        from: Addr,
        to: Addr,
    },
    TextChanged {
        node: Vec<u8>,
        key: String,
        value: String,
    },
    /// Legacy write to the native coin slot
    AddrChanged {
        node: Vec<u8>,
        address: Vec<u8>,
    },
    AddressChanged {
        node: Vec<u8>,
        coin_type: u64,
        address: Vec<u8>,
    },
    ContenthashChanged {
        node: Vec<u8>,
        hash: Option<Vec<u8>>,
    },
    /// Emitted by a registrar controller next to `NameCreated`, never by the registry itself.
    NameRegistered {
        node: Vec<u8>,
        price: Uint128,
        payment_token: String,
    },
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::NameCreated { .. } => EventKind::NameCreated,
            LedgerEvent::ExpiryUpdated { .. } => EventKind::ExpiryUpdated,
            LedgerEvent::NameRevoked { .. } => EventKind::NameRevoked,
            LedgerEvent::Transferred { .. } => EventKind::Transferred,
            LedgerEvent::TextChanged { .. } => EventKind::TextChanged,
            LedgerEvent::AddrChanged { .. } => EventKind::AddrChanged,
            LedgerEvent::AddressChanged { .. } => EventKind::AddressChanged,
            LedgerEvent::ContenthashChanged { .. } => EventKind::ContenthashChanged,
            LedgerEvent::NameRegistered { .. } => EventKind::NameRegistered,
        }
    }

    pub fn node(&self) -> &[u8] {
        match self {
            LedgerEvent::NameCreated { node, .. }
            | LedgerEvent::ExpiryUpdated { node, .. }
            | LedgerEvent::NameRevoked { node, .. }
            | LedgerEvent::Transferred { node, .. }
            | LedgerEvent::TextChanged { node, .. }
            | LedgerEvent::AddrChanged { node, .. }
            | LedgerEvent::AddressChanged { node, .. }
            | LedgerEvent::ContenthashChanged { node, .. }
            | LedgerEvent::NameRegistered { node, .. } => node,
        }
    }

    pub fn to_event(&self) -> Event {
        let event = Event::new(self.kind().as_str()).add_attribute("node", encode_node(self.node()));
        match self {
            LedgerEvent::NameCreated {
                label,
                owner,
                expiry,
                ..
            } => event
                .add_attribute("label", label)
                .add_attribute("owner", owner.as_str())
                .add_attribute("expiry", expiry.to_string()),
            LedgerEvent::ExpiryUpdated { expiry, .. } => {
                event.add_attribute("expiry", expiry.to_string())
            }
            LedgerEvent::NameRevoked { admin, .. } => event.add_attribute("admin", admin.as_str()),
            LedgerEvent::Transferred { from, to, .. } => event
                .add_attribute("from", from.as_str())
                .add_attribute("to", to.as_str()),
            LedgerEvent::TextChanged { key, value, .. } => {
                event.add_attribute("key", key).add_attribute("value", value)
            }
            LedgerEvent::AddrChanged { address, .. } => {
                event.add_attribute("address", hex::encode(address))
            }
            LedgerEvent::AddressChanged {
                coin_type, address, ..
            } => event
                .add_attribute("coin_type", coin_type.to_string())
                .add_attribute("address", hex::encode(address)),
            // An empty hash attribute means the content hash was cleared
            LedgerEvent::ContenthashChanged { hash, .. } => event.add_attribute(
                "hash",
                hash.as_ref().map(hex::encode).unwrap_or_default(),
            ),
            LedgerEvent::NameRegistered {
                price,
                payment_token,
                ..
            } => event
                .add_attribute("price", price.to_string())
                .add_attribute("payment_token", payment_token),
        }
    }

    pub fn from_event(event: &Event) -> Result<LedgerEvent, EventError> {
        LedgerEvent::from_parts(&event.ty, &event.attributes)
    }

    pub fn from_parts(ty: &str, attributes: &[Attribute]) -> Result<LedgerEvent, EventError> {
        let kind = EventKind::from_event_type(ty).ok_or_else(|| EventError::UnknownType {
            ty: ty.to_string(),
        })?;
        let attrs = Attributes { kind, attributes };
        let node = attrs.node()?;
        let event = match kind {
            EventKind::NameCreated => LedgerEvent::NameCreated {
                node,
                label: attrs.string("label")?,
                owner: attrs.addr("owner")?,
                expiry: attrs.u64("expiry")?,
            },
            EventKind::ExpiryUpdated => LedgerEvent::ExpiryUpdated {
                node,
                expiry: attrs.u64("expiry")?,
            },
            EventKind::NameRevoked => LedgerEvent::NameRevoked {
                node,
                admin: attrs.addr("admin")?,
            },
            EventKind::Transferred => LedgerEvent::Transferred {
                node,
                from: attrs.addr("from")?,
                to: attrs.addr("to")?,
            },
            EventKind::TextChanged => LedgerEvent::TextChanged {
                node,
                key: attrs.string("key")?,
                value: attrs.string("value")?,
            },
            EventKind::AddrChanged => LedgerEvent::AddrChanged {
                node,
                address: attrs.bytes("address")?,
            },
            EventKind::AddressChanged => LedgerEvent::AddressChanged {
                node,
                coin_type: attrs.u64("coin_type")?,
                address: attrs.bytes("address")?,
            },
            EventKind::ContenthashChanged => {
                let hash = attrs.bytes("hash")?;
                LedgerEvent::ContenthashChanged {
                    node,
                    hash: if hash.is_empty() { None } else { Some(hash) },
                }
            }
            EventKind::NameRegistered => LedgerEvent::NameRegistered {
                node,
                price: Uint128::new(attrs.parse::<u128>("price")?),
                payment_token: attrs.string("payment_token")?,
            },
        };
        Ok(event)
    }
}

struct Attributes<'a> {
    kind: EventKind,
    attributes: &'a [Attribute],
}

impl<'a> Attributes<'a> {
    fn raw(&self, key: &str) -> Result<&'a str, EventError> {
        // Last occurrence wins if a key is repeated
        self.attributes
            .iter()
            .rev()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
            .ok_or_else(|| EventError::MissingAttribute {
                kind: self.kind,
                key: key.to_string(),
            })
    }

    fn invalid(&self, key: &str, value: &str) -> EventError {
        EventError::InvalidAttribute {
            kind: self.kind,
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn string(&self, key: &str) -> Result<String, EventError> {
        self.raw(key).map(str::to_string)
    }

    fn addr(&self, key: &str) -> Result<Addr, EventError> {
        let value = self.raw(key)?;
        if value.is_empty() {
            return Err(self.invalid(key, value));
        }
        Ok(Addr::unchecked(value))
    }

    fn parse<T: std::str::FromStr>(&self, key: &str) -> Result<T, EventError> {
        let value = self.raw(key)?;
        value.parse::<T>().map_err(|_| self.invalid(key, value))
    }

    fn u64(&self, key: &str) -> Result<u64, EventError> {
        self.parse::<u64>(key)
    }

    fn node(&self) -> Result<Vec<u8>, EventError> {
        let node = self.bytes("node")?;
        if node.len() != 32 {
            return Err(self.invalid("node", self.raw("node")?));
        }
        Ok(node)
    }

    fn bytes(&self, key: &str) -> Result<Vec<u8>, EventError> {
        let value = self.raw(key)?;
        decode_node(value).map_err(|_| self.invalid(key, value))
    }
}
