use thiserror::Error;
use vidchat_core::AppError;
use vidchat_services::ServiceError;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("{model} does not support {operation}")]
    NotSupported {
        model: String,
        operation: &'static str,
    },

    #[error("{0} is not configured")]
    MissingApiKey(&'static str),

    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode provider payload: {0}")]
    Decode(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        ModelError::Provider { status, body }
    }
}

impl From<ServiceError> for ModelError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingApiKey(var) => ModelError::MissingApiKey(var),
            ServiceError::Http(e) => ModelError::Http(e),
            ServiceError::Upstream { status, body } => ModelError::Provider { status, body },
            ServiceError::Decode(msg) | ServiceError::Stream(msg) => ModelError::Decode(msg),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownModel(id) => AppError::ModelNotFound(id),
            ModelError::NotSupported { .. } => AppError::NotSupported(err.to_string()),
            ModelError::MissingApiKey(_) => AppError::Internal(err.to_string()),
            ModelError::Provider { .. } | ModelError::Http(_) | ModelError::Decode(_) => {
                AppError::Provider(err.to_string())
            }
        }
    }
}
