//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite adapter for world metadata
//! - Storage: content blob stores (folder, in-memory)
//! - Ethereum / Subgraph: name ownership data sources
//! - HTTP: read-only REST routes
//! - Config: Application configuration
//! - State: Shared application state and wiring

pub mod config;
pub mod deny_list;
pub mod ethereum;
pub mod http;
pub mod limits;
pub mod notifications;
pub mod persistence;
pub mod state;
pub mod storage;
pub mod subgraph;
