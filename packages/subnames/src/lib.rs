pub mod events;
pub mod registry;
pub mod resolver;
pub mod utils;
