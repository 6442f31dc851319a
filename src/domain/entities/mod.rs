//! Domain entities - Core business objects with identity

mod entity;
mod scene;
mod world;

pub use entity::{ContentMapping, Entity, EntityType};
pub use scene::{SceneDisplay, SceneMetadata, WorldConfiguration};
pub use world::{DeployedWorld, SceneDeployment, WorldMetadata, WorldRuntimeMetadata};
