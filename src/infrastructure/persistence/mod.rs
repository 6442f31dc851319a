//! SQLite persistence adapters

mod world_repository;

pub use world_repository::SqliteWorldsRepository;
