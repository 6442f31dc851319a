//! Ethereum RPC port - read-only contract calls

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The call executed and reverted; not an infrastructure failure
    #[error("Execution reverted: {0}")]
    Reverted(String),
    #[error("RPC transport error: {0}")]
    Transport(String),
    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait EthereumRpcPort: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;
}
