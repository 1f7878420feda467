use crate::credentials::resolve_credentials;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use affix_core::{ConfigError, FileSource, RuntimeConfig, StorageConfig};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ClientOptions, ObjectStore, ObjectStoreExt,
    PutOptions, PutPayload,
};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Bucket-keyed remote object storage
///
/// Paths are used as object keys below the configured bucket. Static headers
/// from the configuration are sent with every write, with the attachment's
/// content type taking precedence over a configured `Content-Type`.
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    attributes: Attributes,
}

impl fmt::Debug for ObjectStoreStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreStorage")
            .field("store", &self.store.to_string())
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl ObjectStoreStorage {
    /// Build an S3-compatible store from the attachment's storage configuration.
    ///
    /// Settings not given explicitly (region, keys) fall back to the usual
    /// `AWS_*` environment variables.
    pub fn new(config: &StorageConfig, runtime: &RuntimeConfig) -> StorageResult<Self> {
        let bucket = config
            .bucket
            .clone()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidStorageOption {
                option: "bucket".to_string(),
                reason: "the objectstore backend requires a bucket".to_string(),
            })?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());

        if let Some(ref region) = config.region {
            builder = builder.with_region(region.clone());
        }

        if let Some(ref endpoint) = config.endpoint {
            let allow_http = endpoint.starts_with("http://")
                || config.protocol.as_deref() == Some("http");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        if let Some(ref credentials) = config.credentials {
            let keys = resolve_credentials(credentials, &runtime.environment)?;
            builder = builder
                .with_access_key_id(keys.access_key_id)
                .with_secret_access_key(keys.secret_access_key);
            if let Some(token) = keys.session_token {
                builder = builder.with_token(token);
            }
        }

        if let Some(ref permissions) = config.permissions {
            builder = builder.with_client_options(
                ClientOptions::new().with_default_headers(acl_headers(permissions)?),
            );
        }

        let store = builder.build().map_err(|e| ConfigError::InvalidStorageOption {
            option: "objectstore".to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            bucket = %bucket,
            region = ?config.region,
            endpoint = ?config.endpoint,
            "Object store configured"
        );

        Ok(Self::with_store(Arc::new(store), bucket, config))
    }

    /// Wrap an already constructed store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        config: &StorageConfig,
    ) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in &config.headers {
            attributes.insert(header_attribute(name), AttributeValue::from(value.clone()));
        }

        Self {
            store,
            bucket: bucket.into(),
            attributes,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location(path: &str) -> Path {
        Path::from(path.trim_start_matches('/'))
    }

    fn backend_error(path: &str, source: ObjectStoreError) -> StorageError {
        StorageError::Backend {
            backend: StorageBackend::ObjectStore,
            path: path.to_string(),
            source: Box::new(source),
        }
    }
}

/// Map a configured header name onto an object attribute. Names without a
/// dedicated attribute are stored as user metadata.
fn header_attribute(name: &str) -> Attribute {
    match name.to_ascii_lowercase().as_str() {
        "content-type" => Attribute::ContentType,
        "cache-control" => Attribute::CacheControl,
        "content-disposition" => Attribute::ContentDisposition,
        "content-encoding" => Attribute::ContentEncoding,
        "content-language" => Attribute::ContentLanguage,
        other => Attribute::Metadata(Cow::Owned(
            other.trim_start_matches("x-amz-meta-").to_string(),
        )),
    }
}

fn acl_headers(permissions: &str) -> StorageResult<HeaderMap> {
    let value = HeaderValue::from_str(permissions).map_err(|e| {
        ConfigError::InvalidStorageOption {
            option: "permissions".to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-amz-acl"), value);
    Ok(headers)
}

#[async_trait]
impl Storage for ObjectStoreStorage {
    async fn write(
        &self,
        path: &str,
        data: FileSource,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        let location = Self::location(path);
        let bytes = data.read().await.map_err(|source| StorageError::ReadFailed {
            path: path.to_string(),
            source,
        })?;
        let size = bytes.len();

        let mut attributes = self.attributes.clone();
        if let Some(content_type) = content_type {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        self.store
            .put_opts(&location, PutPayload::from(bytes), options)
            .await
            .map_err(|e| Self::backend_error(path, e))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %path,
            size_bytes = size,
            content_type = ?content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store write successful"
        );

        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let location = Self::location(path);
        let start = std::time::Instant::now();

        match self.store.delete(&location).await {
            Ok(()) => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %path,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object store delete successful"
                );
                Ok(())
            }
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(bucket = %self.bucket, key = %path, "Nothing to delete");
                Ok(())
            }
            Err(e) => Err(Self::backend_error(path, e)),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match self.store.head(&Self::location(path)).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(Self::backend_error(path, e)),
        }
    }

    async fn to_readable_file(&self, path: &str) -> StorageResult<Option<FileSource>> {
        let result = match self.store.get(&Self::location(path)).await {
            Ok(result) => result,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(Self::backend_error(path, e)),
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| Self::backend_error(path, e))?;

        Ok(Some(FileSource::Memory(bytes)))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::ObjectStore
    }
}
