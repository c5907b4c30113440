use crate::backend::{FileStore, KeyStream};
use crate::keys::{path_to_key, resolve_under};
use crate::StorageError;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use oss_config::Provider;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;
use walkdir::WalkDir;

/// Keys buffered between the directory walker and the consumer
const LIST_CHANNEL_CAPACITY: usize = 64;

/// Directory below the root holding uploads in progress. Never listed, never a key.
const STAGING_DIR: &str = ".oss-staging";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend
///
/// Every key maps to a regular file below `root`.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Opens a store rooted at `root`, creating the directory (and its parents) if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref();

        tokio::fs::create_dir_all(root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Cannot create storage root {}: {}",
                root.display(),
                e
            ))
        })?;

        let root = tokio::fs::canonicalize(root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Cannot resolve storage root {}: {}",
                root.display(),
                e
            ))
        })?;

        tokio::fs::create_dir_all(root.join(STAGING_DIR)).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Cannot create staging directory in {}: {}",
                root.display(),
                e
            ))
        })?;

        tracing::debug!("Local storage rooted at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        resolve_key(&self.root, key)
    }

    /// Writes through a staging file so the key never points at a partial blob
    async fn write_atomically<F, Fut>(&self, key: &str, write: F) -> Result<(), StorageError>
    where
        F: FnOnce(tokio::fs::File) -> Fut + Send,
        Fut: std::future::Future<Output = std::io::Result<()>> + Send,
    {
        let target = self.path_for(key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::create_dir_all(self.root.join(STAGING_DIR)).await?;

        let temp = self.staging_path();
        let result = async {
            let file = tokio::fs::File::create(&temp).await?;
            write(file).await?;
            tokio::fs::rename(&temp, &target).await
        }
        .await;

        if let Err(e) = result {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!("Failed to remove temp file {}: {}", temp.display(), cleanup);
                }
            }
            return Err(StorageError::UploadError(key.to_string(), e.to_string()));
        }

        tracing::debug!("Stored {} at {}", key, target.display());
        Ok(())
    }

    async fn open_for_read(&self, key: &str) -> Result<tokio::fs::File, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if is_absent(&e) => Err(StorageError::FileNotFound(key.to_string())),
            Err(e) => Err(StorageError::DownloadError(key.to_string(), e.to_string())),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(STAGING_DIR)
            .join(format!("{}-{}.tmp", std::process::id(), n))
    }
}

/// A path component that does not exist, or a parent that is a file, both mean "no such blob"
fn is_absent(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Resolves a key below `root`, refusing the staging directory.
fn resolve_key(root: &Path, key: &str) -> Result<PathBuf, StorageError> {
    let path = resolve_under(root, key)?;

    let first = Path::new(key).components().find_map(|c| match c {
        Component::Normal(name) => Some(name),
        _ => None,
    });
    if first == Some(OsStr::new(STAGING_DIR)) {
        return Err(StorageError::InvalidKey(
            key.to_string(),
            format!("'{}' is reserved for uploads in progress", STAGING_DIR),
        ));
    }

    Ok(path)
}

/// Walks `dir` on a blocking thread, sending keys relative to `root`.
///
/// `label` names the listing in errors. The staging directory is skipped and
/// the walker stops as soon as the receiving stream is dropped.
async fn walk(root: PathBuf, dir: PathBuf, label: String) -> KeyStream {
    match tokio::fs::metadata(&dir).await {
        Ok(_) => {}
        Err(e) if is_absent(&e) => return stream::empty().boxed(),
        Err(e) => {
            let err = StorageError::ListError(label, e.to_string());
            return stream::once(async move { Err(err) }).boxed();
        }
    }

    let staging = root.join(STAGING_DIR);
    let (tx, rx) = mpsc::channel(LIST_CHANNEL_CAPACITY);
    tokio::task::spawn_blocking(move || {
        let entries = WalkDir::new(&dir)
            .into_iter()
            .filter_entry(|entry| entry.path() != staging);

        for entry in entries {
            let item = match entry {
                Ok(entry) if entry.file_type().is_file() => match entry.path().strip_prefix(&root) {
                    Ok(relative) => Ok(path_to_key(relative)),
                    Err(_) => continue,
                },
                Ok(_) => continue,
                Err(e) => Err(StorageError::ListError(label.clone(), e.to_string())),
            };

            if tx.blocking_send(item).is_err() {
                tracing::trace!("Listing of {} abandoned by consumer", dir.display());
                break;
            }
        }
    });

    ReceiverStream::new(rx).boxed()
}

#[async_trait::async_trait]
impl FileStore for LocalBackend {
    fn list(&self, prefix: Option<&str>) -> KeyStream {
        let root = self.root.clone();
        let prefix = prefix.unwrap_or_default();
        let dir = if prefix.is_empty() {
            Ok(root.clone())
        } else {
            resolve_key(&root, prefix)
        };

        match dir {
            Ok(dir) => stream::once(walk(root, dir, prefix.to_string())).flatten().boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    async fn upload_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        tracing::info!("Uploading {} to {}", path.display(), key);

        let mut source = tokio::fs::File::open(path).await?;
        self.write_atomically(key, |mut file| async move {
            tokio::io::copy(&mut source, &mut file).await?;
            file.sync_all().await
        })
        .await
    }

    async fn upload_bytes(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        tracing::info!("Uploading {} bytes to {}", content.len(), key);

        self.write_atomically(key, |mut file| async move {
            file.write_all(&content).await?;
            file.sync_all().await
        })
        .await
    }

    async fn upload_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), StorageError> {
        tracing::info!("Uploading stream to {}", key);

        self.write_atomically(key, |mut file| async move {
            tokio::io::copy(reader, &mut file).await?;
            file.sync_all().await
        })
        .await
    }

    async fn download_bytes(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if is_absent(&e) => Err(StorageError::FileNotFound(key.to_string())),
            Err(e) => Err(StorageError::DownloadError(key.to_string(), e.to_string())),
        }
    }

    async fn download_to(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), StorageError> {
        let mut file = self.open_for_read(key).await?;
        tokio::io::copy(&mut file, &mut *sink)
            .await
            .map_err(|e| StorageError::DownloadError(key.to_string(), e.to_string()))?;
        sink.flush().await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Deleted {}", key);
                Ok(())
            }
            Err(e) if is_absent(&e) => {
                tracing::warn!("Delete skipped, {} does not exist", key);
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteError(key.to_string(), e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn generate_download_url(&self, key: &str, _expiry_secs: u64) -> Result<Url, StorageError> {
        Err(StorageError::Unsupported(format!(
            "local storage cannot sign download URLs (key '{}')",
            key
        )))
    }

    fn provider(&self) -> Provider {
        Provider::Local
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
