//! Compiled template artifact storage.
//!
//! Artifacts are small text blobs addressed by their generated file name.
//! Writes are fatal to the enclosing operation; deletes are best-effort at
//! every call site (failure is logged, never propagated).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::errors::AppError;

/// Key prefix under which compiled artifacts live in the bucket.
const ARTIFACT_PREFIX: &str = "templates";

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Uploads a compiled artifact under its file name.
    async fn put(&self, file_name: &str, content: &str) -> Result<(), AppError>;

    /// Reads a compiled artifact back as UTF-8 text.
    async fn get(&self, file_name: &str) -> Result<String, AppError>;

    /// Deletes an artifact.
    async fn delete(&self, file_name: &str) -> Result<(), AppError>;
}

/// S3/MinIO-backed artifact store shared by all service instances.
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn key(file_name: &str) -> String {
        format!("{ARTIFACT_PREFIX}/{file_name}")
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, file_name: &str, content: &str) -> Result<(), AppError> {
        let key = Self::key(file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(content.as_bytes().to_vec()))
            .content_type("text/html")
            .send()
            .await
            .map_err(|e| AppError::TemplateSaveFailed(format!("S3 upload of {key} failed: {e}")))?;

        info!("Uploaded template artifact to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, file_name: &str) -> Result<String, AppError> {
        let key = Self::key(file_name);
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("S3 read of {key} failed: {e}")))?;

        let bytes = resp
            .body
            .collect()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("S3 body read of {key} failed: {e}")))?
            .into_bytes();

        String::from_utf8(bytes.to_vec()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("artifact {key} is not valid UTF-8: {e}"))
        })
    }

    async fn delete(&self, file_name: &str) -> Result<(), AppError> {
        let key = Self::key(file_name);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("S3 delete of {key} failed: {e}")))?;

        info!("Deleted template artifact s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
