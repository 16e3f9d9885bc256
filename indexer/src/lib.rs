//! Off-chain side of the subname service.
//!
//! Reads the registry's event log, projects it into a read model keyed by node,
//! and answers queries and gateway lookups from that model.

pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod model;
pub mod projector;
pub mod query;
pub mod source;
pub mod store;
pub mod telemetry;

pub use config::{IndexerConfig, ProjectorConfig};
pub use envelope::{Checkpoint, DecodedLog, LogPosition, RawLog};
pub use error::{ApplyError, ConfigError, GatewayError, ProjectorError, SourceError, StoreError};
pub use model::NodeId;
pub use projector::Projector;
pub use query::QueryApi;
