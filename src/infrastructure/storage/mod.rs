use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

pub mod s3;

/// A single-object write.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub acl: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub e_tag: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid upload request: {0}")]
    InvalidRequest(String),

    #[error("object store error: {0}")]
    Service(String),
}

/// Remote object store that answers each put with exactly one outcome.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Rejects access policies the store does not know, without any I/O.
    fn check_acl(&self, _acl: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn put_object(&self, object: PutObject) -> Result<UploadReceipt, StoreError>;
}
