use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{ContentStoragePort, StorageError};

/// Content storage held in memory. Used by tests and local runs without a
/// storage folder.
#[derive(Default)]
pub struct InMemoryContentStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
    #[cfg(test)]
    writes: std::sync::Mutex<HashMap<String, usize>>,
}

impl InMemoryContentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.files.try_read().map(|files| files.len()).unwrap_or(0)
    }

    /// Number of times `key` was actually written
    #[cfg(test)]
    pub fn write_count(&self, key: &str) -> usize {
        self.writes
            .lock()
            .map(|writes| writes.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ContentStoragePort for InMemoryContentStorage {
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.files.read().await.get(key).cloned())
    }

    async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut files = self.files.write().await;
        if files.get(key).is_some_and(|existing| existing == bytes) {
            return Ok(());
        }
        files.insert(key.to_string(), bytes.to_vec());
        #[cfg(test)]
        if let Ok(mut writes) = self.writes.lock() {
            *writes.entry(key.to_string()).or_default() += 1;
        }
        Ok(())
    }

    async fn exist(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.files.read().await.contains_key(key))
    }

    async fn exist_multiple(&self, keys: &[String]) -> Result<HashMap<String, bool>, StorageError> {
        let files = self.files.read().await;
        Ok(keys
            .iter()
            .map(|key| (key.clone(), files.contains_key(key)))
            .collect())
    }

    async fn file_info_multiple(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Option<u64>>, StorageError> {
        let files = self.files.read().await;
        Ok(keys
            .iter()
            .map(|key| (key.clone(), files.get(key).map(|bytes| bytes.len() as u64)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identical_bytes_are_written_once() {
        let storage = InMemoryContentStorage::new();
        storage.store("bafkreia", b"hello").await.unwrap();
        storage.store("bafkreia", b"hello").await.unwrap();

        assert_eq!(storage.write_count("bafkreia"), 1);
        assert_eq!(storage.retrieve("bafkreia").await.unwrap(), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_sizes_and_existence() {
        let storage = InMemoryContentStorage::new();
        storage.store("a", b"12345").await.unwrap();
        let keys = vec!["a".to_string(), "b".to_string()];

        let exist = storage.exist_multiple(&keys).await.unwrap();
        let sizes = storage.file_info_multiple(&keys).await.unwrap();

        assert_eq!(exist["a"], true);
        assert_eq!(exist["b"], false);
        assert_eq!(sizes["a"], Some(5));
        assert_eq!(sizes["b"], None);
        assert!(!storage.exist("b").await.unwrap());
    }
}
