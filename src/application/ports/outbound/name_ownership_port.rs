//! Name ownership port - resolve a world name to its controlling wallet

use async_trait::async_trait;

use super::{RpcError, SubgraphError};
use crate::domain::value_objects::EthAddress;

#[derive(Debug, thiserror::Error)]
pub enum NameOwnershipError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Subgraph(#[from] SubgraphError),
}

#[async_trait]
pub trait NameOwnershipPort: Send + Sync {
    /// `Ok(None)` when the name has no owner; errors only for infrastructure
    /// failures
    async fn find_owner(&self, name: &str) -> Result<Option<EthAddress>, NameOwnershipError>;
}
