//! Content storage adapters

mod folder;
#[cfg(test)]
mod memory;

pub use folder::FolderContentStorage;
#[cfg(test)]
pub use memory::InMemoryContentStorage;
