use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Processing state reported by the remote file service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Processing,
    Active,
    Failed,
    #[default]
    #[serde(other)]
    StateUnspecified,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Active | JobState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Processing => "PROCESSING",
            JobState::Active => "ACTIVE",
            JobState::Failed => "FAILED",
            JobState::StateUnspecified => "STATE_UNSPECIFIED",
        }
    }
}

/// An asynchronous processing task on the remote AI service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteJob {
    /// Resource name, e.g. "files/abc123"
    pub id: String,
    pub state: JobState,
    /// Resource URI usable in generation requests
    pub uri: String,
    pub mime_type: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_state_is_unspecified() {
        let state: JobState = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(state, JobState::StateUnspecified);
        assert!(!state.is_terminal());
        let active: JobState = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert!(active.is_terminal());
    }
}
