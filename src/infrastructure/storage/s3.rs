use super::{ObjectStore, PutObject, StoreError, UploadReceipt};
use crate::config::settings::StorageConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use tracing::{debug, info};

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            // Custom endpoints are MinIO-style and need path addressing
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            "✅ S3 client ready (region {}, endpoint {})",
            config.region,
            config.endpoint.as_deref().unwrap_or("default")
        );

        Self { client }
    }
}

fn canned_acl(acl: &str) -> Result<ObjectCannedAcl, StoreError> {
    if ObjectCannedAcl::values().contains(&acl) {
        Ok(ObjectCannedAcl::from(acl))
    } else {
        Err(StoreError::InvalidRequest(format!(
            "unknown access policy '{}'",
            acl
        )))
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    fn check_acl(&self, acl: &str) -> Result<(), StoreError> {
        canned_acl(acl).map(|_| ())
    }

    async fn put_object(&self, object: PutObject) -> Result<UploadReceipt, StoreError> {
        let acl = object.acl.as_deref().map(canned_acl).transpose()?;

        debug!(
            "Putting {} bytes to s3://{}/{}",
            object.body.len(),
            object.bucket,
            object.key
        );

        let output = self
            .client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .set_acl(acl)
            .content_type(&object.content_type)
            .body(ByteStream::from(object.body))
            .send()
            .await
            .map_err(|e| StoreError::Service(DisplayErrorContext(&e).to_string()))?;

        Ok(UploadReceipt {
            bucket: object.bucket,
            key: object.key,
            e_tag: output.e_tag().map(str::to_string),
            version_id: output.version_id().map(str::to_string),
        })
    }
}
