//! Name ownership resolution
//!
//! `.eth` names outside `.dcl.eth` go to the ENS resolver, everything else to
//! the DCL-name resolver picked at startup. A caching decorator wraps the
//! router as a whole.

mod caching;
mod dcl;
mod ens;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::application::ports::outbound::{NameOwnershipError, NameOwnershipPort};
use crate::domain::value_objects::EthAddress;

pub use caching::CachingNameOwnership;
pub use dcl::{OnChainDclNameOwnership, SubgraphDclNameOwnership};
pub use ens::{EnsContracts, EnsNameOwnership};

pub(crate) const DCL_SUFFIX: &str = ".dcl.eth";

/// Whether `name` (already lower-cased) belongs to the ENS namespace
pub fn is_ens_name(name: &str) -> bool {
    name.ends_with(".eth") && !name.ends_with(DCL_SUFFIX)
}

/// Dispatches to exactly one resolver per name
pub struct NameOwnershipRouter {
    ens: Arc<dyn NameOwnershipPort>,
    dcl: Arc<dyn NameOwnershipPort>,
}

impl NameOwnershipRouter {
    pub fn new(ens: Arc<dyn NameOwnershipPort>, dcl: Arc<dyn NameOwnershipPort>) -> Self {
        Self { ens, dcl }
    }
}

#[async_trait]
impl NameOwnershipPort for NameOwnershipRouter {
    async fn find_owner(&self, name: &str) -> Result<Option<EthAddress>, NameOwnershipError> {
        let name = name.to_lowercase();
        let owner = if is_ens_name(&name) {
            self.ens.find_owner(&name).await?
        } else {
            self.dcl.find_owner(&name).await?
        };

        info!(
            world = %name,
            owner = owner.as_ref().map(EthAddress::as_str).unwrap_or("none"),
            "Fetched owner of world"
        );
        Ok(owner)
    }
}

/// Resolver for disabled namespaces: nobody owns anything
pub struct NoopNameOwnership;

#[async_trait]
impl NameOwnershipPort for NoopNameOwnership {
    async fn find_owner(&self, _name: &str) -> Result<Option<EthAddress>, NameOwnershipError> {
        Ok(None)
    }
}
