//! Error types module
//!
//! All failures that can reach an HTTP client are unified under [`AppError`].
//! Each variant self-describes how it is presented (status, code, log level)
//! through the [`ErrorMetadata`] trait so that the API layer stays a thin renderer.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an exhausted poll budget
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "VALIDATION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Validation failed: {}", .reasons.join(", "))]
    ValidationFailed { reasons: Vec<String> },

    #[error("No file uploaded")]
    MissingFile,

    #[error("Chunk out of sequence: {0}")]
    SequenceError(String),

    #[error("Upload session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Blob storage error: {0}")]
    UpstreamBlobFailure(String),

    #[error("Remote job {job_id} failed: {reason}")]
    RemoteJobFailed { job_id: String, reason: String },

    #[error("Remote job {job_id} still processing after {attempts} attempts")]
    RemoteJobTimedOut { job_id: String, attempts: u32 },

    #[error("Remote job {job_id} abandoned: request cancelled")]
    RemoteJobCancelled { job_id: String },

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Unauthenticated(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Sign in and retry with a valid session"),
            false,
            LogLevel::Debug,
        ),
        AppError::ValidationFailed { .. } => (
            400,
            "VALIDATION_FAILED",
            false,
            Some("Check file size and type and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::MissingFile => (
            400,
            "MISSING_FILE",
            false,
            Some("Send the file in the 'file' form field"),
            false,
            LogLevel::Debug,
        ),
        AppError::SequenceError(_) => (
            400,
            "SEQUENCE_ERROR",
            true,
            Some("Resend the chunk starting at the expected offset"),
            false,
            LogLevel::Debug,
        ),
        AppError::SessionNotFound(_) => (
            404,
            "UPLOAD_SESSION_NOT_FOUND",
            false,
            Some("Restart the upload from offset 0"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::UpstreamBlobFailure(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::RemoteJobFailed { .. } => (
            500,
            "REMOTE_JOB_FAILED",
            false,
            Some("Check the video encoding and upload again"),
            false,
            LogLevel::Warn,
        ),
        AppError::RemoteJobTimedOut { .. } => (
            500,
            "REMOTE_JOB_TIMED_OUT",
            true,
            Some("Upload again later"),
            false,
            LogLevel::Warn,
        ),
        AppError::RemoteJobCancelled { .. } => (
            500,
            "REMOTE_JOB_CANCELLED",
            true,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::RemoteService(_) => (
            500,
            "REMOTE_SERVICE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::ModelNotFound(_) => (
            404,
            "MODEL_NOT_FOUND",
            false,
            Some("Use one of the models listed by /api/models"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotSupported(_) => (
            501,
            "NOT_SUPPORTED",
            false,
            Some("Use the streaming endpoint for this model"),
            false,
            LogLevel::Debug,
        ),
        AppError::Provider(_) => (
            502,
            "PROVIDER_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::ValidationFailed { .. } => "ValidationFailed",
            AppError::MissingFile => "MissingFile",
            AppError::SequenceError(_) => "SequenceError",
            AppError::SessionNotFound(_) => "SessionNotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::UpstreamBlobFailure(_) => "UpstreamBlobFailure",
            AppError::RemoteJobFailed { .. } => "RemoteJobFailed",
            AppError::RemoteJobTimedOut { .. } => "RemoteJobTimedOut",
            AppError::RemoteJobCancelled { .. } => "RemoteJobCancelled",
            AppError::RemoteService(_) => "RemoteService",
            AppError::ModelNotFound(_) => "ModelNotFound",
            AppError::NotSupported(_) => "NotSupported",
            AppError::Provider(_) => "Provider",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Unauthenticated(_) => "Unauthorized".to_string(),
            AppError::ValidationFailed { reasons } => reasons.join(", "),
            AppError::MissingFile => "No file uploaded".to_string(),
            AppError::SequenceError(ref msg) => msg.clone(),
            AppError::SessionNotFound(ref msg) => format!("Upload session not found: {}", msg),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::UpstreamBlobFailure(_) => "Upload failed".to_string(),
            AppError::RemoteJobFailed { .. } => "Video processing failed".to_string(),
            AppError::RemoteJobTimedOut { attempts, .. } => format!(
                "Video processing did not finish after {} status checks",
                attempts
            ),
            AppError::RemoteJobCancelled { .. } => "Request cancelled".to_string(),
            AppError::RemoteService(_) => "Video processing service unavailable".to_string(),
            AppError::ModelNotFound(ref id) => format!("Unknown model: {}", id),
            AppError::NotSupported(ref msg) => msg.clone(),
            AppError::Provider(_) => "Model provider request failed".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_renders_unauthorized() {
        let err = AppError::Unauthenticated("missing token".to_string());
        assert_eq!(err.http_status_code(), 401);
        assert_eq!(err.client_message(), "Unauthorized");
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_validation_failed_joins_every_reason() {
        let err = AppError::ValidationFailed {
            reasons: vec![
                "File size should be less than 50MB".to_string(),
                "File type should be JPEG, PNG, or MP4".to_string(),
            ],
        };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert_eq!(
            err.client_message(),
            "File size should be less than 50MB, File type should be JPEG, PNG, or MP4"
        );
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_remote_job_outcomes_are_distinct() {
        let failed = AppError::RemoteJobFailed {
            job_id: "files/abc".to_string(),
            reason: "FAILED".to_string(),
        };
        let timed_out = AppError::RemoteJobTimedOut {
            job_id: "files/abc".to_string(),
            attempts: 10,
        };
        assert_eq!(failed.http_status_code(), 500);
        assert_eq!(timed_out.http_status_code(), 500);
        assert_ne!(failed.error_code(), timed_out.error_code());
        assert!(!failed.is_recoverable());
        assert!(timed_out.is_recoverable());
        assert!(timed_out.client_message().contains("10"));
    }

    #[test]
    fn test_storage_failure_is_sensitive() {
        let err = AppError::UpstreamBlobFailure("bucket policy denied".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Upload failed");
        assert!(err.detailed_message().contains("bucket policy denied"));
    }

    #[test]
    fn test_not_supported_status() {
        let err = AppError::NotSupported("video-model only supports streaming".to_string());
        assert_eq!(err.http_status_code(), 501);
        assert_eq!(err.suggested_action(), Some("Use the streaming endpoint for this model"));
    }
}
