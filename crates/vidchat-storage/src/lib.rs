//! Vidchat Storage Library
//!
//! Blob storage for completed uploads. The [`Storage`] trait is implemented for the
//! local filesystem and for S3 (through `object_store`).
//!
//! # Object key format
//!
//! Objects are stored flat under `uploads/{stem}-{suffix}.{ext}`, where `stem` is
//! the sanitized client file name and `suffix` a random alphanumeric string, so two
//! uploads of the same file never collide. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{put_object, ObjectHeaders, Storage, StorageError, StorageResult};
pub use vidchat_core::StorageBackend;
