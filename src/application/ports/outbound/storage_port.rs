//! Content storage port - content-addressed blob store

use std::collections::HashMap;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Blob store keyed by content hash (or a derived key such as `<id>.auth`).
/// Writing the same key twice keeps a single copy.
#[async_trait]
pub trait ContentStoragePort: Send + Sync {
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn exist(&self, key: &str) -> Result<bool, StorageError>;

    async fn exist_multiple(&self, keys: &[String]) -> Result<HashMap<String, bool>, StorageError>;

    /// Byte size per key; `None` for keys that are not stored
    async fn file_info_multiple(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Option<u64>>, StorageError>;
}
