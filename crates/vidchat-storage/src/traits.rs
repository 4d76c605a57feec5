//! The blob store the upload pipeline writes completed files into.

use crate::keys;
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use vidchat_core::models::StoredObject;
use vidchat_core::AppError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::UpstreamBlobFailure(other.to_string()),
        }
    }
}

/// Headers stored alongside an object
#[derive(Debug, Clone, Copy)]
pub struct ObjectHeaders<'a> {
    pub content_type: &'a str,
    pub content_disposition: &'a str,
}

/// Opaque, write-once blob store
///
/// Objects are never overwritten or read back by the service; clients fetch
/// them through the returned public URL.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `key` and return the public URL of the object
    async fn put(&self, key: &str, data: Bytes, headers: ObjectHeaders<'_>)
        -> StorageResult<String>;

    /// Whether an object exists under `key`; also serves as a reachability probe
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}

/// Store a completed upload under a fresh collision-free key.
pub async fn put_object(
    storage: &dyn Storage,
    filename: &str,
    content_type: &str,
    data: Bytes,
) -> StorageResult<StoredObject> {
    let pathname = keys::generate_pathname(filename);
    let content_disposition = keys::content_disposition(filename);

    let url = storage
        .put(
            &pathname,
            data,
            ObjectHeaders {
                content_type,
                content_disposition: &content_disposition,
            },
        )
        .await?;

    Ok(StoredObject {
        download_url: keys::download_url(&url),
        url,
        pathname,
        content_type: content_type.to_string(),
        content_disposition,
    })
}
