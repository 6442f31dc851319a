//! ENS ownership through the base registrar and the name wrapper

use std::sync::Arc;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::outbound::{
    EthereumRpcPort, NameOwnershipError, NameOwnershipPort, RpcError,
};
use crate::domain::value_objects::EthAddress;

sol! {
    interface IERC721 {
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsContracts {
    pub base_registrar: Address,
    pub name_wrapper: Address,
}

pub struct EnsNameOwnership {
    rpc: Arc<dyn EthereumRpcPort>,
    contracts: EnsContracts,
}

impl EnsNameOwnership {
    pub fn new(rpc: Arc<dyn EthereumRpcPort>, contracts: EnsContracts) -> Self {
        Self { rpc, contracts }
    }

    async fn owner_of(&self, contract: Address, token: B256) -> Result<Option<Address>, RpcError> {
        let data = IERC721::ownerOfCall {
            tokenId: U256::from_be_bytes(token.0),
        }
        .abi_encode();

        match self.rpc.call(contract, Bytes::from(data)).await {
            Ok(output) => decode_address(&output).map(Some),
            Err(RpcError::Reverted(reason)) => {
                debug!(contract = %contract, reason = %reason, "ownerOf reverted");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl NameOwnershipPort for EnsNameOwnership {
    async fn find_owner(&self, name: &str) -> Result<Option<EthAddress>, NameOwnershipError> {
        let name = name.to_lowercase();
        let labels: Vec<&str> = name.split('.').collect();

        let owner = if labels.len() == 2 {
            match self
                .owner_of(self.contracts.base_registrar, labelhash(labels[0]))
                .await?
            {
                Some(owner) if owner == self.contracts.name_wrapper => {
                    debug!(name = %name, "ENS name is wrapped");
                    self.owner_of(self.contracts.name_wrapper, namehash(&name))
                        .await?
                }
                other => other,
            }
        } else {
            self.owner_of(self.contracts.name_wrapper, namehash(&name))
                .await?
        };

        let owner = owner
            .filter(|owner| !owner.is_zero())
            .map(|owner| EthAddress::parse(&format!("{owner:#x}")))
            .transpose()
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        debug!(name = %name, owner = ?owner, "Resolved ENS owner");
        Ok(owner)
    }
}

pub(crate) fn labelhash(label: &str) -> B256 {
    keccak256(label.as_bytes())
}

/// EIP-137 name hash
pub(crate) fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(labelhash(label).as_slice());
        node = keccak256(buf);
    }
    node
}

/// An ABI-encoded `address` return value: the last 20 bytes of one word
pub(crate) fn decode_address(output: &[u8]) -> Result<Address, RpcError> {
    if output.len() < 32 {
        return Err(RpcError::InvalidResponse(format!(
            "expected 32 bytes, got {}",
            output.len()
        )));
    }
    Ok(Address::from_slice(&output[12..32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const REGISTRAR: Address = Address::repeat_byte(0x11);
    const WRAPPER: Address = Address::repeat_byte(0x22);
    const OWNER: Address = Address::repeat_byte(0xab);

    /// Answers `ownerOf` per (contract, token) and records every call
    #[derive(Default)]
    struct MockRpc {
        answers: HashMap<(Address, B256), Result<Address, RpcError>>,
        calls: Mutex<Vec<Address>>,
    }

    impl MockRpc {
        fn answer(mut self, contract: Address, token: B256, result: Result<Address, RpcError>) -> Self {
            self.answers.insert((contract, token), result);
            self
        }
    }

    #[async_trait]
    impl EthereumRpcPort for MockRpc {
        async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
            self.calls.lock().unwrap().push(to);
            let call = IERC721::ownerOfCall::abi_decode(&data).unwrap();
            let token = B256::from(call.tokenId.to_be_bytes::<32>());
            match self.answers.get(&(to, token)) {
                Some(Ok(address)) => {
                    let mut word = [0u8; 32];
                    word[12..].copy_from_slice(address.as_slice());
                    Ok(Bytes::from(word.to_vec()))
                }
                Some(Err(RpcError::Reverted(r))) => Err(RpcError::Reverted(r.clone())),
                Some(Err(e)) => Err(RpcError::Transport(e.to_string())),
                None => Err(RpcError::Reverted("unknown token".into())),
            }
        }
    }

    fn contracts() -> EnsContracts {
        EnsContracts {
            base_registrar: REGISTRAR,
            name_wrapper: WRAPPER,
        }
    }

    #[test]
    fn test_namehash_matches_eip137_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            format!("{:x}", namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            format!("{:x}", namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[tokio::test]
    async fn test_unwrapped_name_uses_base_registrar_only() {
        let rpc = Arc::new(MockRpc::default().answer(REGISTRAR, labelhash("vitalik"), Ok(OWNER)));
        let ens = EnsNameOwnership::new(rpc.clone(), contracts());

        let owner = ens.find_owner("Vitalik.eth").await.unwrap().unwrap();

        assert!(owner.matches(&format!("{OWNER:#x}")));
        assert_eq!(*rpc.calls.lock().unwrap(), vec![REGISTRAR]);
    }

    #[tokio::test]
    async fn test_wrapped_name_is_resolved_through_wrapper() {
        let rpc = Arc::new(
            MockRpc::default()
                .answer(REGISTRAR, labelhash("wrapped"), Ok(WRAPPER))
                .answer(WRAPPER, namehash("wrapped.eth"), Ok(OWNER)),
        );
        let ens = EnsNameOwnership::new(rpc.clone(), contracts());

        let owner = ens.find_owner("wrapped.eth").await.unwrap().unwrap();

        assert!(owner.matches(&format!("{OWNER:#x}")));
        assert_eq!(*rpc.calls.lock().unwrap(), vec![REGISTRAR, WRAPPER]);
    }

    #[tokio::test]
    async fn test_subdomain_goes_straight_to_wrapper() {
        let rpc = Arc::new(MockRpc::default().answer(WRAPPER, namehash("a.b.eth"), Ok(OWNER)));
        let ens = EnsNameOwnership::new(rpc.clone(), contracts());

        assert!(ens.find_owner("a.b.eth").await.unwrap().is_some());
        assert_eq!(*rpc.calls.lock().unwrap(), vec![WRAPPER]);
    }

    #[tokio::test]
    async fn test_revert_and_zero_address_mean_no_owner() {
        let rpc = Arc::new(MockRpc::default().answer(REGISTRAR, labelhash("zero"), Ok(Address::ZERO)));
        let ens = EnsNameOwnership::new(rpc, contracts());

        assert!(ens.find_owner("zero.eth").await.unwrap().is_none());
        assert!(ens.find_owner("unregistered.eth").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let rpc = Arc::new(MockRpc::default().answer(
            REGISTRAR,
            labelhash("down"),
            Err(RpcError::Transport("connection refused".into())),
        ));
        let ens = EnsNameOwnership::new(rpc, contracts());

        assert!(ens.find_owner("down.eth").await.is_err());
    }
}
