//! Application services - Use case implementations
//!
//! Each service follows hexagonal architecture principles: it receives its
//! collaborators as ports (or other services) and returns domain entities or
//! DTOs. Deployment flows through `DeploymentService`, which validates with
//! `Validator` and persists through `EntityDeployer`.

pub mod cache;
pub mod deployment_service;
pub mod entity_deployer;
pub mod metrics;
pub mod name_deny_list;
pub mod name_ownership;
pub mod name_permission_checker;
pub mod permissions_service;
pub mod validation;
pub mod worlds_indexer;
pub mod worlds_manager;

pub use deployment_service::{DeploymentError, DeploymentOutcome, DeploymentService};
pub use entity_deployer::EntityDeployer;
pub use metrics::DeploymentMetrics;
pub use name_deny_list::NameDenyList;
pub use name_permission_checker::NamePermissionChecker;
pub use permissions_service::{PermissionsError, PermissionsService};
pub use validation::{Validator, ValidatorConfig};
pub use worlds_indexer::WorldsIndexer;
pub use worlds_manager::WorldsManager;
