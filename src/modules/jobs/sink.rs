use super::dto::{Destination, UploadConfirmation};
use super::error::{JobError, Step};
use super::executors::guarded;
use crate::infrastructure::scratch::ScratchFile;
use crate::infrastructure::storage::{ObjectStore, PutObject};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Persists executor output to the object store, if one is configured.
#[derive(Clone, Default)]
pub struct UploadSink {
    store: Option<Arc<dyn ObjectStore>>,
}

impl UploadSink {
    pub fn new(store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { store }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Checks that `destination` can be written before any work is done.
    pub fn check(&self, destination: &Destination) -> Result<(), JobError> {
        let store = self.store.as_ref().ok_or(JobError::StoreNotConfigured)?;
        if let Some(acl) = &destination.acl {
            store
                .check_acl(acl)
                .map_err(|e| JobError::InvalidParameters(e.to_string()))?;
        }
        Ok(())
    }

    /// Reads `file` fully into memory and writes it as one object.
    pub async fn upload(
        &self,
        file: &ScratchFile,
        destination: &Destination,
        limit: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<UploadConfirmation, JobError> {
        let store = self.store.as_ref().ok_or(JobError::StoreNotConfigured)?;

        let body = guarded(Step::Read, None, cancel, async {
            tokio::fs::read(&file.path)
                .await
                .map_err(|source| JobError::Filesystem {
                    path: file.path.clone(),
                    source,
                })
        })
        .await?;

        let content_type = destination.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&destination.key)
                .first_or_octet_stream()
                .to_string()
        });

        info!(
            "⬆️ Uploading {} bytes to {}/{}",
            body.len(),
            destination.bucket,
            destination.key
        );

        let object = PutObject {
            bucket: destination.bucket.clone(),
            key: destination.key.clone(),
            acl: destination.acl.clone(),
            content_type: content_type.clone(),
            body: Bytes::from(body),
        };

        let receipt = guarded(Step::Upload, limit, cancel, async {
            store
                .put_object(object)
                .await
                .map_err(JobError::UploadFailure)
        })
        .await?;

        Ok(UploadConfirmation {
            bucket: receipt.bucket,
            key: receipt.key,
            content_type,
            e_tag: receipt.e_tag,
            version_id: receipt.version_id,
        })
    }
}
