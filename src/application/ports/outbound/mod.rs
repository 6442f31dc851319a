//! Outbound ports - Interfaces that the application requires from external systems

mod deny_list_port;
mod ethereum_port;
mod limits_port;
mod name_ownership_port;
mod notification_port;
mod storage_port;
mod subgraph_port;
mod worlds_repository_port;

pub use deny_list_port::{BannedNamesPort, DenyListError};
pub use ethereum_port::{EthereumRpcPort, RpcError};
pub use limits_port::{LimitsError, LimitsPort};
pub use name_ownership_port::{NameOwnershipError, NameOwnershipPort};
pub use notification_port::{DeploymentNotifierPort, NotificationError};
pub use storage_port::{ContentStoragePort, StorageError};
pub use subgraph_port::{SubgraphError, SubgraphPort};
pub use worlds_repository_port::{RepositoryError, WorldsRepositoryPort};
