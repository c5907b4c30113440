use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "super::defaults::storage_settings")]
    pub storage: StorageSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: super::defaults::storage_settings(),
        }
    }
}

/// Which backend a store is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    S3,
    Gcs,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::S3 => "s3",
            Provider::Gcs => "gcs",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "super::defaults::provider")]
    pub provider: Provider,
    #[serde(default = "super::defaults::local_settings")]
    pub local: LocalSettings,
    #[serde(default = "super::defaults::s3_settings")]
    pub s3: S3Settings,
    #[serde(default = "super::defaults::gcs_settings")]
    pub gcs: GcsSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalSettings {
    #[serde(default = "super::defaults::local_root_path")]
    pub root_path: String,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct S3Settings {
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "super::defaults::s3_region")]
    pub region: String,
    #[serde(default = "super::defaults::bucket")]
    pub bucket: String,
    /// Endpoint override for S3-compatible services (MinIO, R2, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    /// `MaxKeys` sent with each listing request; the service default applies when unset
    #[serde(default)]
    pub page_size: Option<i32>,
}

impl S3Settings {
    pub fn has_static_credentials(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }
}

// Keeps the secret key out of logs
impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GcsSettings {
    #[serde(default = "super::defaults::bucket")]
    pub bucket: String,
    #[serde(default)]
    pub service_account_path: Option<String>,
}
