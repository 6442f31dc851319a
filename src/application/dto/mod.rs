//! Data Transfer Objects - For API boundaries
//!
//! Values that cross the application boundary: deployment inputs and outcomes,
//! the worlds index and permission change requests.

mod deployment;
mod index;
mod permissions;

pub use deployment::{
    DeploymentNotification, DeploymentRequest, DeploymentResult, DeploymentToValidate,
    NotifiedEntity, ValidationResult,
};
pub use index::{SceneData, WorldData, WorldsIndex};
pub use permissions::{AccessControlList, SetPermissionRequest};
