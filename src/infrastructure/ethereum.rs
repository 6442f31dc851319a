//! JSON-RPC client for read-only contract calls

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::application::ports::outbound::{EthereumRpcPort, RpcError};

pub struct JsonRpcEthereumClient {
    client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl JsonRpcEthereumClient {
    pub fn new(client: Client, rpc_url: &str) -> Self {
        Self {
            client,
            rpc_url: rpc_url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Geth-style nodes answer reverts with code 3, others only say so in the
/// message.
fn is_revert(error: &JsonRpcErrorObject) -> bool {
    error.code == 3 || error.message.to_lowercase().contains("revert")
}

fn parse_call_response(body: &str) -> Result<Bytes, RpcError> {
    let response: JsonRpcResponse =
        serde_json::from_str(body).map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

    if let Some(error) = response.error {
        if is_revert(&error) {
            return Err(RpcError::Reverted(error.message));
        }
        return Err(RpcError::Transport(format!("{} (code {})", error.message, error.code)));
    }

    let result = response
        .result
        .ok_or_else(|| RpcError::InvalidResponse("missing result".to_string()))?;
    result
        .parse::<Bytes>()
        .map_err(|e| RpcError::InvalidResponse(format!("{result}: {e}")))
}

#[async_trait]
impl EthereumRpcPort for JsonRpcEthereumClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "eth_call",
            params: json!([{ "to": to, "data": data }, "latest"]),
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RpcError::Transport(format!("{status}: {error_text}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        parse_call_response(&body)
    }
}
