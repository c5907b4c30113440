use crate::presign::DEFAULT_URL_EXPIRY_SECS;
use crate::StorageError;
use bytes::Bytes;
use futures::stream::BoxStream;
use oss_config::Provider;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite};
use url::Url;

/// Lazy sequence of keys returned by [`FileStore::list`].
///
/// Nothing is fetched until the stream is first polled. The stream owns the
/// resource it reads from (directory walker or page fetcher); dropping it
/// releases that resource, also when iteration stops early.
pub type KeyStream = BoxStream<'static, Result<String, StorageError>>;

/// File storage abstraction shared by the local, S3 and GCS backends
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Lists every key starting with `prefix` (all keys when `None` or empty).
    ///
    /// Order is backend defined. A prefix matching nothing yields an empty stream.
    fn list(&self, prefix: Option<&str>) -> KeyStream;

    /// Upload a local file, replacing any blob stored under `key`
    async fn upload_file(&self, key: &str, path: &Path) -> Result<(), StorageError>;

    /// Upload an in-memory buffer, replacing any blob stored under `key`
    async fn upload_bytes(&self, key: &str, content: Bytes) -> Result<(), StorageError>;

    /// Upload everything `reader` yields until EOF, replacing any blob stored under `key`.
    ///
    /// The reader is only borrowed: it is not closed and stays usable by the caller.
    async fn upload_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), StorageError>;

    /// Download the whole blob. Fails with [`StorageError::FileNotFound`] if absent.
    async fn download_bytes(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Stream the blob into `sink` and flush it. Fails with
    /// [`StorageError::FileNotFound`] if absent.
    async fn download_to(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), StorageError>;

    /// Delete the blob. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Check whether a blob is stored under `key`
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Generate a read-only URL for `key` that expires after `expiry_secs`.
    ///
    /// Backends without signed URLs return [`StorageError::Unsupported`].
    async fn generate_download_url(&self, key: &str, expiry_secs: u64) -> Result<Url, StorageError>;

    /// Generate a read-only URL for `key` that expires after 10 minutes
    async fn generate_default_download_url(&self, key: &str) -> Result<Url, StorageError> {
        self.generate_download_url(key, DEFAULT_URL_EXPIRY_SECS).await
    }

    /// Provider backing this store
    fn provider(&self) -> Provider;

    /// Human readable location (root directory or bucket URL)
    fn location(&self) -> String;
}
