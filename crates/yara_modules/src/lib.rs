//! Module schema loader for the yaramod engine: JSON schema documents,
//! feature-flag filtering, and the `ModulePool` condition expressions
//! resolve identifiers against.

mod flags;
mod pool;
mod schema;

pub use flags::FeatureFlags;
pub use pool::{Module, ModulePool, ModulePoolConfig};
pub use schema::{node_to_symbol, SchemaNode, SchemaOverload};
