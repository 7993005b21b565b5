use async_trait::async_trait;

use crate::errors::StorageError;

pub mod local;

/// Object store holding the binary image assets.
///
/// Paths are `/`-separated keys such as `store/prints/1700000000000_moon.png`.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Writes the bytes and returns the public URL of the new object.
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError>;

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Deleting a missing object succeeds.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    fn public_url(&self, path: &str) -> String;
}
