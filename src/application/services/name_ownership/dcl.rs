//! DCL name ownership: marketplace subgraph or the on-chain registrar

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::ens::decode_address;
use super::DCL_SUFFIX;
use crate::application::ports::outbound::{
    EthereumRpcPort, NameOwnershipError, NameOwnershipPort, RpcError, SubgraphError, SubgraphPort,
};
use crate::domain::value_objects::EthAddress;

sol! {
    interface IDclRegistrar {
        function getOwnerOf(string _subdomain) external view returns (address);
    }
}

// Registered names are case-sensitive while callers are not. There is no
// case-insensitive equality filter, so match prefix and suffix and compare
// exactly on this side.
const OWNER_FOR_DCL_NAME_QUERY: &str = r#"query FetchOwnerForDclName($worldName: String) {
  nfts(
    where: {name_starts_with_nocase: $worldName, name_ends_with_nocase: $worldName, category: ens}
    orderBy: name
    first: 1000
  ) {
    name
    owner {
      id
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct NamesResponse {
    nfts: Vec<NameNft>,
}

#[derive(Debug, Deserialize)]
struct NameNft {
    name: String,
    owner: NftOwner,
}

#[derive(Debug, Deserialize)]
struct NftOwner {
    id: String,
}

fn strip_dcl_suffix(name: &str) -> &str {
    name.strip_suffix(DCL_SUFFIX).unwrap_or(name)
}

pub struct SubgraphDclNameOwnership {
    subgraph: Arc<dyn SubgraphPort>,
}

impl SubgraphDclNameOwnership {
    pub fn new(subgraph: Arc<dyn SubgraphPort>) -> Self {
        Self { subgraph }
    }
}

#[async_trait]
impl NameOwnershipPort for SubgraphDclNameOwnership {
    async fn find_owner(&self, name: &str) -> Result<Option<EthAddress>, NameOwnershipError> {
        let name = name.to_lowercase();
        let label = strip_dcl_suffix(&name);

        let data = self
            .subgraph
            .query(OWNER_FOR_DCL_NAME_QUERY, json!({ "worldName": label }))
            .await?;
        let response: NamesResponse = serde_json::from_value(data)
            .map_err(|e| SubgraphError::InvalidResponse(e.to_string()))?;

        let owner = response
            .nfts
            .into_iter()
            .find(|nft| format!("{}{}", nft.name.to_lowercase(), DCL_SUFFIX) == name)
            .map(|nft| EthAddress::parse(&nft.owner.id))
            .transpose()
            .map_err(|e| SubgraphError::InvalidResponse(e.to_string()))?;

        debug!(name = %name, owner = ?owner, "Resolved DCL owner from subgraph");
        Ok(owner)
    }
}

pub struct OnChainDclNameOwnership {
    rpc: Arc<dyn EthereumRpcPort>,
    registrar: Address,
}

impl OnChainDclNameOwnership {
    pub fn new(rpc: Arc<dyn EthereumRpcPort>, registrar: Address) -> Self {
        Self { rpc, registrar }
    }
}

#[async_trait]
impl NameOwnershipPort for OnChainDclNameOwnership {
    async fn find_owner(&self, name: &str) -> Result<Option<EthAddress>, NameOwnershipError> {
        let name = name.to_lowercase();
        let data = IDclRegistrar::getOwnerOfCall {
            _subdomain: strip_dcl_suffix(&name).to_string(),
        }
        .abi_encode();

        let owner = match self.rpc.call(self.registrar, Bytes::from(data)).await {
            Ok(output) => decode_address(&output)?,
            Err(RpcError::Reverted(reason)) => {
                debug!(name = %name, reason = %reason, "getOwnerOf reverted");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if owner.is_zero() {
            return Ok(None);
        }
        let owner = EthAddress::parse(&format!("{owner:#x}"))
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        debug!(name = %name, owner = %owner, "Resolved DCL owner on chain");
        Ok(Some(owner))
    }
}
