//! Domain services - Pure business logic operations

mod permission_checker;
mod runtime_metadata;

pub use permission_checker::{PermissionChecker, PermissionConfigError, PermissionExtras};
pub use runtime_metadata::extract_world_runtime_metadata;
