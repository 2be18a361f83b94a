//! Blob store contract and the S3-backed production implementation.

#![allow(dead_code)]

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::AppError;

/// How long a share URL handed to an external consumer stays valid.
const SHARE_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// A file to be stored, with enough metadata to serve it back later.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the file and returns its opaque locator.
    async fn upload(&self, file: UploadFile) -> Result<String, AppError>;

    async fn read(&self, locator: &str) -> Result<Bytes, AppError>;

    async fn delete(&self, locator: &str) -> Result<(), AppError>;

    /// Locators stored under the given directory prefix.
    async fn list(&self, dir: &str) -> Result<Vec<String>, AppError>;

    /// A time-limited URL an external service can fetch the blob from.
    async fn share_url(&self, locator: &str) -> Result<String, AppError>;
}

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub async fn check_ready(&self) -> Result<(), AppError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("bucket '{}' not reachable: {e}", self.bucket)))?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, file: UploadFile) -> Result<String, AppError> {
        let key = format!("uploads/{}/{}", Uuid::new_v4(), file.file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&file.content_type)
            .body(ByteStream::from(file.bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("put_object failed: {e}")))?;
        Ok(key)
    }

    async fn read(&self, locator: &str) -> Result<Bytes, AppError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("get_object '{locator}' failed: {e}")))?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("reading '{locator}' failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, locator: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(locator)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("delete_object '{locator}' failed: {e}")))?;
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, AppError> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(dir)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("list_objects '{dir}' failed: {e}")))?;
        Ok(response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect())
    }

    async fn share_url(&self, locator: &str) -> Result<String, AppError> {
        let presigning = PresigningConfig::expires_in(SHARE_URL_TTL)
            .map_err(|e| AppError::Storage(format!("presigning config: {e}")))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage(format!("presign '{locator}' failed: {e}")))?;
        Ok(request.uri().to_string())
    }
}
