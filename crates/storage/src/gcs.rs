use crate::backend::{FileStore, KeyStream};
use crate::presign::validate_expiry;
use crate::StorageError;
use bytes::Bytes;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use oss_config::{GcsSettings, Provider};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use url::Url;

/// Google Cloud Storage backend
///
/// Download URLs are signed with the V4 scheme (`GOOG4-RSA-SHA256`), which
/// needs a service account able to sign.
pub struct GcsBackend {
    bucket: String,
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn Signer>,
}

impl GcsBackend {
    /// Builds a client for `settings.bucket`.
    ///
    /// Credentials come from `settings.service_account_path` when set, otherwise
    /// from the usual `GOOGLE_*` environment variables.
    pub fn new(settings: &GcsSettings) -> Result<Self, StorageError> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(&settings.bucket);
        if let Some(path) = settings.service_account_path.as_deref().filter(|p| !p.is_empty()) {
            builder = builder.with_service_account_path(path);
        }

        let client = builder.build().map_err(|e| {
            StorageError::ConfigError(format!("Cannot build GCS client for bucket '{}': {}", settings.bucket, e))
        })?;

        let client = Arc::new(client);
        Ok(Self::from_parts(settings.bucket.clone(), client.clone(), client))
    }

    /// Assembles a backend from any object store and URL signer
    pub fn from_parts(bucket: impl Into<String>, store: Arc<dyn ObjectStore>, signer: Arc<dyn Signer>) -> Self {
        Self {
            bucket: bucket.into(),
            store,
            signer,
        }
    }

    async fn get(&self, key: &str) -> Result<object_store::GetResult, StorageError> {
        let path = object_path(key)?;
        self.store.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => StorageError::FileNotFound(key.to_string()),
            e => StorageError::DownloadError(key.to_string(), e.to_string()),
        })
    }

    async fn put(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        let path = object_path(key)?;
        self.store
            .put(&path, PutPayload::from(content))
            .await
            .map_err(|e| StorageError::UploadError(key.to_string(), e.to_string()))?;

        tracing::info!("Upload complete: gs://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// Parses a key into an object path. Empty, `.` and `..` segments are refused.
fn object_path(key: &str) -> Result<ObjectPath, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string(), "key must not be empty".to_string()));
    }
    let path = ObjectPath::parse(key)
        .map_err(|e| StorageError::InvalidKey(key.to_string(), e.to_string()))?;
    // Parsing drops leading and trailing '/', which would alias distinct keys
    if path.as_ref() != key {
        return Err(StorageError::InvalidKey(
            key.to_string(),
            "leading or trailing '/' is not allowed".to_string(),
        ));
    }
    Ok(path)
}

/// Directory to list for a raw string prefix.
///
/// Object store listings match whole path segments, so `txt/te` lists `txt`
/// and the caller filters on the full prefix.
fn listing_scope(prefix: &str) -> Option<ObjectPath> {
    let (parent, _) = prefix.rsplit_once('/')?;
    if parent.is_empty() {
        return None;
    }
    ObjectPath::parse(parent).ok()
}

#[async_trait::async_trait]
impl FileStore for GcsBackend {
    fn list(&self, prefix: Option<&str>) -> KeyStream {
        let prefix = prefix.unwrap_or_default().to_string();
        let store = self.store.clone();

        stream::once(async move {
            let scope = listing_scope(&prefix);
            let label = prefix.clone();
            store
                .list(scope.as_ref())
                .map_err(move |e| StorageError::ListError(label.clone(), e.to_string()))
                .map_ok(|meta| meta.location.to_string())
                .try_filter(move |key| future::ready(key.starts_with(prefix.as_str())))
        })
        .flatten()
        .boxed()
    }

    async fn upload_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        tracing::info!("Uploading {} to GCS bucket {} as {}", path.display(), self.bucket, key);
        let content = tokio::fs::read(path).await?;
        self.put(key, Bytes::from(content)).await
    }

    async fn upload_bytes(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        tracing::info!("Uploading {} bytes to GCS bucket {} as {}", content.len(), self.bucket, key);
        self.put(key, content).await
    }

    async fn upload_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), StorageError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;

        tracing::info!("Uploading {} streamed bytes to GCS bucket {} as {}", buffer.len(), self.bucket, key);
        self.put(key, Bytes::from(buffer)).await
    }

    async fn download_bytes(&self, key: &str) -> Result<Bytes, StorageError> {
        self.get(key)
            .await?
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadError(key.to_string(), e.to_string()))
    }

    async fn download_to(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), StorageError> {
        let mut chunks = self.get(key).await?.into_stream();

        while let Some(chunk) = chunks
            .try_next()
            .await
            .map_err(|e| StorageError::DownloadError(key.to_string(), e.to_string()))?
        {
            sink.write_all(&chunk).await?;
        }

        sink.flush().await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = object_path(key)?;
        match self.store.delete(&path).await {
            Ok(()) => {
                tracing::info!("Deleted gs://{}/{}", self.bucket, key);
                Ok(())
            }
            Err(object_store::Error::NotFound { .. }) => {
                tracing::warn!("Delete skipped, gs://{}/{} does not exist", self.bucket, key);
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteError(key.to_string(), e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = object_path(key)?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::DownloadError(key.to_string(), e.to_string())),
        }
    }

    async fn generate_download_url(&self, key: &str, expiry_secs: u64) -> Result<Url, StorageError> {
        let path = object_path(key)?;
        let expires_in = validate_expiry(expiry_secs)?;

        self.signer
            .signed_url(http::Method::GET, &path, expires_in)
            .await
            .map_err(|e| StorageError::PresignError(key.to_string(), e.to_string()))
    }

    fn provider(&self) -> Provider {
        Provider::Gcs
    }

    fn location(&self) -> String {
        format!("gs://{}", self.bucket)
    }
}
