use crate::{FileStore, LocalBackend, StorageError};
use oss_config::{Provider, StorageSettings};
use std::sync::Arc;

/// Opens the store selected by `settings.provider`.
///
/// S3 construction talks to the bucket (and may create it); the other
/// providers only touch the network once an operation runs.
pub async fn open_store(settings: &StorageSettings) -> Result<Arc<dyn FileStore>, StorageError> {
    tracing::debug!("Opening {} storage", settings.provider);

    let store: Arc<dyn FileStore> = match settings.provider {
        Provider::Local => Arc::new(LocalBackend::new(&settings.local.root_path).await?),
        Provider::S3 => open_s3(settings).await?,
        Provider::Gcs => open_gcs(settings)?,
    };

    tracing::info!("Using {} storage at {}", store.provider(), store.location());
    Ok(store)
}

#[cfg(feature = "s3")]
async fn open_s3(settings: &StorageSettings) -> Result<Arc<dyn FileStore>, StorageError> {
    Ok(Arc::new(crate::S3Backend::new(&settings.s3).await?))
}

#[cfg(not(feature = "s3"))]
async fn open_s3(_settings: &StorageSettings) -> Result<Arc<dyn FileStore>, StorageError> {
    Err(missing_feature(Provider::S3, "s3"))
}

#[cfg(feature = "gcs")]
fn open_gcs(settings: &StorageSettings) -> Result<Arc<dyn FileStore>, StorageError> {
    Ok(Arc::new(crate::GcsBackend::new(&settings.gcs)?))
}

#[cfg(not(feature = "gcs"))]
fn open_gcs(_settings: &StorageSettings) -> Result<Arc<dyn FileStore>, StorageError> {
    Err(missing_feature(Provider::Gcs, "gcs"))
}

#[cfg(any(not(feature = "s3"), not(feature = "gcs")))]
fn missing_feature(provider: Provider, feature: &str) -> StorageError {
    StorageError::ConfigError(format!(
        "{} storage support is not compiled in (rebuild with the '{}' feature)",
        provider, feature
    ))
}
