use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::future::try_join_all;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::outbound::{ContentStoragePort, StorageError};

/// Content storage on the local filesystem: one file per key under `root`.
/// Writes go to a temporary file first and are renamed into place, so readers
/// never observe a partial blob.
pub struct FolderContentStorage {
    root: PathBuf,
}

impl FolderContentStorage {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::Backend(format!("Invalid storage key: {key}")));
        }
        Ok(self.root.join(key))
    }

    async fn size_of(path: &Path) -> Result<Option<u64>, StorageError> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ContentStoragePort for FolderContentStorage {
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)?).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if Self::size_of(&path).await?.is_some() {
            debug!(key, "Content already stored");
            return Ok(());
        }

        let tmp = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn exist(&self, key: &str) -> Result<bool, StorageError> {
        Ok(Self::size_of(&self.path_for(key)?).await?.is_some())
    }

    async fn exist_multiple(&self, keys: &[String]) -> Result<HashMap<String, bool>, StorageError> {
        let sizes = self.file_info_multiple(keys).await?;
        Ok(sizes
            .into_iter()
            .map(|(key, size)| (key, size.is_some()))
            .collect())
    }

    async fn file_info_multiple(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Option<u64>>, StorageError> {
        let lookups = keys.iter().map(|key| async move {
            let size = Self::size_of(&self.path_for(key)?).await?;
            Ok::<_, StorageError>((key.clone(), size))
        });
        Ok(try_join_all(lookups).await?.into_iter().collect())
    }
}
