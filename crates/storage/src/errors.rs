use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Upload failed for '{0}': {1}")]
    UploadError(String, String),

    #[error("Download failed for '{0}': {1}")]
    DownloadError(String, String),

    #[error("Delete failed for '{0}': {1}")]
    DeleteError(String, String),

    #[error("Listing failed for '{0}': {1}")]
    ListError(String, String),

    #[error("Signing download URL failed for '{0}': {1}")]
    PresignError(String, String),

    #[error("Invalid storage configuration: {0}")]
    ConfigError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid key '{0}': {1}")]
    InvalidKey(String, String),

    #[error("Invalid download URL expiry: {0}s (must be between 1 and {max}s)", max = crate::presign::MAX_URL_EXPIRY_SECS)]
    InvalidExpiry(u64),
}

/// Coarse classification of a [`StorageError`], shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unsupported,
    InvalidArgument,
    Io,
    Configuration,
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::FileNotFound(_) => ErrorKind::NotFound,
            StorageError::Unsupported(_) => ErrorKind::Unsupported,
            StorageError::InvalidKey(..) | StorageError::InvalidExpiry(_) => ErrorKind::InvalidArgument,
            StorageError::ConfigError(_) => ErrorKind::Configuration,
            StorageError::IoError(_)
            | StorageError::UploadError(..)
            | StorageError::DownloadError(..)
            | StorageError::DeleteError(..)
            | StorageError::ListError(..)
            | StorageError::PresignError(..) => ErrorKind::Io,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
