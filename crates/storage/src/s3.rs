use crate::backend::{FileStore, KeyStream};
use crate::keys::validate_key;
use crate::pagination::{paginate, Page, PageSource};
use crate::presign::validate_expiry;
use crate::StorageError;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::{primitives::ByteStream, Client};
use bytes::Bytes;
use oss_config::{Provider, S3Settings};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use url::Url;

/// Region in which buckets are created without a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3-compatible storage backend
/// Compatible with: AWS S3, MinIO, Cloudflare R2, DigitalOcean Spaces, etc.
pub struct S3Backend {
    client: Client,
    bucket: String,
    page_size: Option<i32>,
}

impl S3Backend {
    /// Connects to the bucket described by `settings`, creating it if it does not exist.
    pub async fn new(settings: &S3Settings) -> Result<Self, StorageError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if settings.has_static_credentials() {
            let credentials = Credentials::new(
                settings.access_key.clone(),
                settings.secret_key.clone(),
                None,
                None,
                "oss-s3",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        let config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .build();

        let backend = Self::with_client(Client::from_conf(config), settings.bucket.clone(), settings.page_size);
        backend.ensure_bucket().await?;
        Ok(backend)
    }

    /// Wraps an already configured client. No request is sent until the first operation.
    pub fn with_client(client: Client, bucket: impl Into<String>, page_size: Option<i32>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            page_size,
        }
    }

    /// Creates the bucket unless a HeadBucket request finds it
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        let head = self.client.head_bucket().bucket(&self.bucket).send().await;

        match head {
            Ok(_) => {
                tracing::debug!("Bucket {} exists", self.bucket);
                return Ok(());
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {}
            Err(e) => {
                return Err(StorageError::ConfigError(format!(
                    "Cannot access bucket '{}': {}",
                    self.bucket,
                    DisplayErrorContext(e)
                )))
            }
        }

        tracing::info!("Bucket {} not found, creating it", self.bucket);

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        let region = self.client.config().region().map(|r| r.as_ref().to_string());
        if let Some(region) = region.filter(|r| r != DEFAULT_REGION) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Cannot create bucket '{}': {}",
                self.bucket,
                DisplayErrorContext(e)
            ))
        })?;

        Ok(())
    }

    async fn put(&self, key: &str, body: ByteStream) -> Result<(), StorageError> {
        validate_key(key)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::UploadError(key.to_string(), DisplayErrorContext(e).to_string()))?;

        tracing::info!("Upload complete: s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<ByteStream, StorageError> {
        validate_key(key)?;

        match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => Ok(output.body),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                Err(StorageError::FileNotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadError(
                key.to_string(),
                DisplayErrorContext(e).to_string(),
            )),
        }
    }
}

/// One `ListObjectsV2` request per page
struct ObjectPages {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    page_size: Option<i32>,
}

#[async_trait::async_trait]
impl PageSource for ObjectPages {
    async fn fetch_page(&self, token: Option<String>) -> Result<Page, StorageError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(self.prefix.clone())
            .set_max_keys(self.page_size)
            .set_continuation_token(token)
            .send()
            .await
            .map_err(|e| {
                StorageError::ListError(
                    self.prefix.clone().unwrap_or_default(),
                    DisplayErrorContext(e).to_string(),
                )
            })?;

        Ok(page_from_output(&output))
    }
}

/// Keys of one `ListObjectsV2` response, plus the token for the next page.
///
/// Only a truncated response with a non-empty token continues the listing.
fn page_from_output(output: &ListObjectsV2Output) -> Page {
    let keys = output
        .contents()
        .iter()
        .filter_map(|object| object.key().map(str::to_string))
        .collect();

    let next_token = if output.is_truncated().unwrap_or(false) {
        output
            .next_continuation_token()
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    Page { keys, next_token }
}

#[async_trait::async_trait]
impl FileStore for S3Backend {
    fn list(&self, prefix: Option<&str>) -> KeyStream {
        paginate(ObjectPages {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            page_size: self.page_size,
        })
    }

    async fn upload_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        tracing::info!("Uploading {} to S3 bucket {} as {}", path.display(), self.bucket, key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::UploadError(key.to_string(), e.to_string()))?;
        self.put(key, body).await
    }

    async fn upload_bytes(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        tracing::info!("Uploading {} bytes to S3 bucket {} as {}", content.len(), self.bucket, key);
        self.put(key, ByteStream::from(content)).await
    }

    async fn upload_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), StorageError> {
        // PutObject needs the content length up front
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;

        tracing::info!("Uploading {} streamed bytes to S3 bucket {} as {}", buffer.len(), self.bucket, key);
        self.put(key, ByteStream::from(buffer)).await
    }

    async fn download_bytes(&self, key: &str) -> Result<Bytes, StorageError> {
        let body = self.get(key).await?;
        let content = body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadError(key.to_string(), e.to_string()))?;
        Ok(content.into_bytes())
    }

    async fn download_to(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), StorageError> {
        let mut body = self.get(key).await?;

        while let Some(chunk) = body
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
        validate_key(key)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteError(key.to_string(), DisplayErrorContext(e).to_string()))?;

        // S3 answers 204 whether or not the key existed
        tracing::debug!("Delete complete: s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;

        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(StorageError::DownloadError(
                key.to_string(),
                DisplayErrorContext(e).to_string(),
            )),
        }
    }

    async fn generate_download_url(&self, key: &str, expiry_secs: u64) -> Result<Url, StorageError> {
        validate_key(key)?;
        let expires_in = validate_expiry(expiry_secs)?;

        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignError(key.to_string(), e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::PresignError(key.to_string(), DisplayErrorContext(e).to_string()))?;

        Url::parse(request.uri()).map_err(|e| StorageError::PresignError(key.to_string(), e.to_string()))
    }

    fn provider(&self) -> Provider {
        Provider::S3
    }

    fn location(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
