//! Domain layer - Core business logic with no I/O
//!
//! This layer contains:
//! - Entities: Entity, scene metadata, world metadata
//! - Value Objects: addresses, auth chains, content hashes, permissions
//! - Domain Services: permission checking, runtime metadata projection

pub mod entities;
pub mod services;
pub mod value_objects;
