/// Default values for configuration fields

pub fn provider() -> super::models::Provider {
    super::models::Provider::Local
}

pub fn local_root_path() -> String {
    "oss-data".to_string()
}

pub fn s3_region() -> String {
    "us-east-1".to_string()
}

pub fn bucket() -> String {
    "oss".to_string()
}

pub fn local_settings() -> super::models::LocalSettings {
    super::models::LocalSettings {
        root_path: local_root_path(),
    }
}

pub fn s3_settings() -> super::models::S3Settings {
    super::models::S3Settings {
        access_key: String::new(),
        secret_key: String::new(),
        region: s3_region(),
        bucket: bucket(),
        endpoint: None,
        force_path_style: false,
        page_size: None,
    }
}

pub fn gcs_settings() -> super::models::GcsSettings {
    super::models::GcsSettings {
        bucket: bucket(),
        service_account_path: None,
    }
}

pub fn storage_settings() -> super::models::StorageSettings {
    super::models::StorageSettings {
        provider: provider(),
        local: local_settings(),
        s3: s3_settings(),
        gcs: gcs_settings(),
    }
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ===============================================================================
# OSS File Store Configuration
# ===============================================================================

[storage]
provider = "local"                   # Storage provider: "local", "s3" or "gcs"

# Local filesystem (only used if provider = "local")
[storage.local]
root_path = "oss-data"               # Root directory, created on startup if missing

# S3-compatible object store (only used if provider = "s3")
[storage.s3]
access_key = ""                      # Access key ID (empty = default AWS credential chain)
secret_key = ""                      # Secret access key
region = "us-east-1"                 # Region (e.g., us-east-1)
bucket = "oss"                       # Bucket name, created on startup if missing
#endpoint = "http://localhost:9000"  # Endpoint override for MinIO, R2, ...
force_path_style = false             # Path-style addressing (required by most MinIO setups)
#page_size = 1000                    # Keys per listing request (1-1000)

# Google Cloud Storage (only used if provider = "gcs")
[storage.gcs]
bucket = "oss"                       # Bucket name
#service_account_path = ""           # Service account JSON (empty = GOOGLE_* environment)
"#;
