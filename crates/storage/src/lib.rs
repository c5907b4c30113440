mod backend;
mod errors;
mod factory;
mod keys;
mod local;
pub mod pagination;
pub mod presign;

#[cfg(feature = "gcs")]
mod gcs;
#[cfg(feature = "s3")]
mod s3;

pub use backend::{FileStore, KeyStream};
pub use errors::{ErrorKind, StorageError};
pub use factory::open_store;
pub use keys::validate_key;
pub use local::LocalBackend;
pub use oss_config::Provider;
pub use presign::{DEFAULT_URL_EXPIRY_SECS, MAX_URL_EXPIRY_SECS};

#[cfg(feature = "gcs")]
pub use gcs::GcsBackend;
#[cfg(feature = "s3")]
pub use s3::S3Backend;
