//! Validation modules

pub mod file_schema;

pub use file_schema::{FileCandidate, FileRule, FileSchema};
