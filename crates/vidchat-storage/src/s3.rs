use crate::traits::{ObjectHeaders, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload};
use std::time::Instant;

/// S3 (or S3-compatible) bucket holding uploads
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    /// Base of the public object URLs, without trailing slash
    public_base: String,
}

impl S3Storage {
    /// Credentials come from the standard `AWS_*` environment variables.
    /// `endpoint_url` selects an S3-compatible provider (e.g. "http://localhost:9000"
    /// for MinIO); its objects are addressed path-style.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        let public_base = match endpoint_url {
            Some(endpoint) => {
                builder = builder
                    .with_allow_http(endpoint.starts_with("http://"))
                    .with_endpoint(endpoint.clone());
                format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
            }
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            public_base,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        headers: ObjectHeaders<'_>,
    ) -> StorageResult<String> {
        let size = data.len();
        let start = Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, headers.content_type.to_string().into());
        attributes.insert(
            Attribute::ContentDisposition,
            headers.content_disposition.to_string().into(),
        );
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&Path::from(key), PutPayload::from(data), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    "S3 put failed"
                );
                StorageError::WriteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_millis() as u64,
            "Object stored in S3"
        );

        Ok(self.object_url(key))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.store.head(&Path::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url_for_custom_endpoint_is_path_style() {
        let storage = S3Storage::new(
            "media".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(
            storage.object_url("uploads/a.mp4"),
            "http://localhost:9000/media/uploads/a.mp4"
        );
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }

    #[tokio::test]
    async fn test_url_for_aws() {
        let storage = S3Storage::new("media".to_string(), "eu-west-1".to_string(), None)
            .await
            .unwrap();

        assert_eq!(
            storage.object_url("uploads/a.mp4"),
            "https://media.s3.eu-west-1.amazonaws.com/uploads/a.mp4"
        );
    }
}
