//! Event log envelope.
//!
//! One JSON object per line:
//! `{"block_height", "log_index", "tx_hash", "event": {"type", "attributes": [{"key", "value"}]}}`.

use std::fmt;

use cosmwasm_std::Event;
use serde::{Deserialize, Serialize};
use subnames::events::{EventError, LedgerEvent};

use crate::model::NodeId;

/// Total order of the log: block height first, then index within the block.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct LogPosition {
    pub block_height: u64,
    pub log_index: u32,
}

impl LogPosition {
    pub fn new(block_height: u64, log_index: u32) -> Self {
        Self {
            block_height,
            log_index,
        }
    }
}

impl fmt::Display for LogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_height, self.log_index)
    }
}

/// How far the projector has read the source.
///
/// `cursor` counts deliveries consumed in the source's own order, so a log that shows up
/// late with a lower position is still fetched. `position` is the highest log position
/// folded in so far and is only reported, never used to filter.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Checkpoint {
    pub cursor: u64,
    pub position: Option<LogPosition>,
}

impl Checkpoint {
    /// Moves the cursor to `cursor` and the position up to `seen`, never down.
    pub fn advance(self, cursor: u64, seen: Option<LogPosition>) -> Self {
        Self {
            cursor,
            position: self.position.max(seen),
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "#{} @ {}", self.cursor, position),
            None => write!(f, "#{}", self.cursor),
        }
    }
}

/// An undecoded log entry as delivered by the source
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RawLog {
    pub block_height: u64,
    pub log_index: u32,
    #[serde(default)]
    pub tx_hash: String,
    pub event: Event,
}

impl RawLog {
    pub fn new(position: LogPosition, tx_hash: impl Into<String>, event: Event) -> Self {
        Self {
            block_height: position.block_height,
            log_index: position.log_index,
            tx_hash: tx_hash.into(),
            event,
        }
    }

    pub fn position(&self) -> LogPosition {
        LogPosition::new(self.block_height, self.log_index)
    }

    pub fn decode(&self) -> Result<DecodedLog, EventError> {
        Ok(DecodedLog {
            position: self.position(),
            tx_hash: self.tx_hash.clone(),
            event: LedgerEvent::from_event(&self.event)?,
        })
    }
}

/// A log entry whose event parsed into a [`LedgerEvent`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DecodedLog {
    pub position: LogPosition,
    pub tx_hash: String,
    pub event: LedgerEvent,
}

impl DecodedLog {
    pub fn node(&self) -> NodeId {
        NodeId::from(self.event.node())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subnames::utils::namehash;

    #[test]
    fn test_parse_json_line() {
        let node = hex::encode(namehash("alice.celo.eth"));
        let line = format!(
            r#"{{"block_height":7,"log_index":2,"tx_hash":"0xabc","event":{{"type":"wasm-text_changed","attributes":[{{"key":"node","value":"{}"}},{{"key":"key","value":"url"}},{{"key":"value","value":"https://alice.example"}}]}}}}"#,
            node
        );
        let raw: RawLog = serde_json::from_str(&line).unwrap();
        assert_eq!(raw.position(), LogPosition::new(7, 2));

        let decoded = raw.decode().unwrap();
        assert_eq!(decoded.tx_hash, "0xabc");
        assert_eq!(
            decoded.event,
            LedgerEvent::TextChanged {
                node: namehash("alice.celo.eth"),
                key: String::from("url"),
                value: String::from("https://alice.example"),
            }
        );
    }

    #[test]
    fn test_positions_order_by_block_then_index() {
        assert!(LogPosition::new(1, 9) < LogPosition::new(2, 0));
        assert!(LogPosition::new(2, 0) < LogPosition::new(2, 1));
        assert_eq!(LogPosition::new(3, 4).to_string(), "3:4");
    }

    #[test]
    fn test_checkpoint_position_only_grows() {
        let checkpoint = Checkpoint::default().advance(2, Some(LogPosition::new(5, 0)));
        let checkpoint = checkpoint.advance(3, Some(LogPosition::new(3, 0)));
        assert_eq!(checkpoint.cursor, 3);
        assert_eq!(checkpoint.position, Some(LogPosition::new(5, 0)));
        assert_eq!(checkpoint.advance(4, None).position, Some(LogPosition::new(5, 0)));
        assert_eq!(checkpoint.to_string(), "#3 @ 5:0");
    }
}
