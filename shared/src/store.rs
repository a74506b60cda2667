use crate::error::FetchError;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::Client as S3Client;
use std::future::Future;

/// Raw object payload plus the content type recorded in its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Read-only access to the origin's objects by key.
pub trait ObjectStore: Send + Sync {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<FetchedObject, FetchError>> + Send;
}

/// `ObjectStore` backed by a single S3 bucket.
///
/// Built once at cold start; the client pools connections across invocations.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, key: &str) -> Result<FetchedObject, FetchError> {
        let result = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(result) => result,
            Err(e) => {
                if let Some(service_error) = e.as_service_error() {
                    if service_error.is_no_such_key() {
                        return Err(FetchError::NotFound(key.to_string()));
                    }
                    if service_error.code() == Some("AccessDenied") {
                        return Err(FetchError::AccessDenied(key.to_string()));
                    }
                }
                return Err(FetchError::Storage {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                });
            }
        };

        let content_type = result.content_type().unwrap_or_default().to_string();

        let bytes = result
            .body
            .collect()
            .await
            .map_err(|e| FetchError::BodyRead {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .into_bytes()
            .to_vec();

        Ok(FetchedObject {
            bytes,
            content_type,
        })
    }
}

/// Turn a request URI into an object key: drop the leading `/` and percent-decode.
///
/// `+` is left alone; only query components use it for spaces.
pub fn object_key(uri: &str) -> Result<String, FetchError> {
    let raw = uri.strip_prefix('/').unwrap_or(uri);
    urlencoding::decode(raw)
        .map(|key| key.into_owned())
        .map_err(|_| FetchError::InvalidKey(raw.to_string()))
}

/// Resolve `uri` and fetch it. Failures are returned for the caller to log.
pub async fn fetch_object<S: ObjectStore>(store: &S, uri: &str) -> Result<FetchedObject, FetchError> {
    let key = object_key(uri)?;
    let object = store.fetch(&key).await?;

    tracing::debug!(
        "Fetched {} ({} bytes, {})",
        key,
        object.bytes.len(),
        object.content_type
    );
    Ok(object)
}
