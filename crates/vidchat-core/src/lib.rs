//! Vidchat Core Library
//!
//! This crate provides the configuration, error types, shared domain models and
//! upload validation used by every vidchat component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
pub use validation::{FileCandidate, FileRule, FileSchema};
// Note: Storage, StorageError, StorageResult live in the vidchat-storage crate
