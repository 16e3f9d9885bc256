pub mod contract;
mod error;
pub mod handler;
pub mod query;
pub mod resolver;
pub mod roles;
pub mod state;


pub use crate::error::ContractError;
