use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;

use super::AssetStorage;
use crate::errors::StorageError;

/// Filesystem-backed asset store rooted at `storage_root`.
#[derive(Debug, Clone)]
pub struct LocalAssetStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAssetStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        LocalAssetStorage {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key onto the root, refusing anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        if path.is_empty() || path.contains('\\') {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                _ => return Err(StorageError::InvalidPath(path.to_string())),
            }
        }

        if resolved == self.root {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(resolved)
    }
}

#[async_trait]
impl AssetStorage for LocalAssetStorage {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::WriteFailed(format!("{path}: {e}")))?;
        }

        fs::write(&target, bytes)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{path}: {e}")))?;

        tracing::debug!(path, content_type, size = bytes.len(), "Asset stored");
        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path)?;

        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(StorageError::ReadFailed(format!("{path}: {e}"))),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;

        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path, "Asset already gone");
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteFailed(format!("{path}: {e}"))),
        }
    }

    fn public_url(&self, path: &str) -> String {
        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.public_base_url, encoded)
    }
}
