use super::errors::ConfigError;
use super::models::{Config, Provider, StorageSettings};

/// S3 never returns more than this many keys per listing page.
const MAX_S3_PAGE_SIZE: i32 = 1000;

impl Config {
    /// Checks that the selected provider has everything it needs to open a store.
    ///
    /// Settings of providers that are not selected are not checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()
    }
}

impl StorageSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider {
            Provider::Local => {
                if self.local.root_path.trim().is_empty() {
                    return Err(invalid("storage.local.root_path must not be empty"));
                }
            }
            Provider::S3 => {
                let s3 = &self.s3;
                if s3.bucket.trim().is_empty() {
                    return Err(invalid("storage.s3.bucket must not be empty"));
                }
                if s3.region.trim().is_empty() {
                    return Err(invalid("storage.s3.region must not be empty"));
                }
                if s3.access_key.is_empty() != s3.secret_key.is_empty() {
                    return Err(invalid(
                        "storage.s3.access_key and storage.s3.secret_key must be set together",
                    ));
                }
                if let Some(endpoint) = &s3.endpoint {
                    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                        return Err(invalid(format!(
                            "storage.s3.endpoint must be an http(s) URL, got '{}'",
                            endpoint
                        )));
                    }
                }
                if let Some(page_size) = s3.page_size {
                    if !(1..=MAX_S3_PAGE_SIZE).contains(&page_size) {
                        return Err(invalid(format!(
                            "storage.s3.page_size must be between 1 and {}, got {}",
                            MAX_S3_PAGE_SIZE, page_size
                        )));
                    }
                }
            }
            Provider::Gcs => {
                if self.gcs.bucket.trim().is_empty() {
                    return Err(invalid("storage.gcs.bucket must not be empty"));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfig(message.into())
}
