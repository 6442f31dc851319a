//! Subgraph port - GraphQL queries against an indexer

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SubgraphError {
    #[error("Subgraph request failed: {0}")]
    Request(String),
    #[error("Subgraph query failed: {0}")]
    Query(String),
    #[error("Unexpected subgraph response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait SubgraphPort: Send + Sync {
    /// Run `query` and return its `data` object
    async fn query(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, SubgraphError>;
}
