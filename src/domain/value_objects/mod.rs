//! Value objects - Immutable objects defined by their attributes

mod auth_chain;
pub mod content_hash;
mod eth_address;
mod permissions;
mod secret;

pub use auth_chain::{AuthChain, AuthLink, AuthLinkType};
pub use eth_address::EthAddress;
pub use permissions::{PermissionKind, PermissionSetting, Permissions, PolicyType, PublicPermissions};
pub use secret::SecretHash;
