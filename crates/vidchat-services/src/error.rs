use thiserror::Error;
use vidchat_core::AppError;

/// Errors from outbound service calls
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to decode upstream payload: {0}")]
    Decode(String),

    #[error("Upstream stream error: {0}")]
    Stream(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Build an `Upstream` error from a non-success response, consuming its body
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        ServiceError::Upstream { status, body }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::RemoteService(err.to_string())
    }
}
