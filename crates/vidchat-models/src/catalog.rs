//! Logical model ids and the user-selectable chat model list.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const CHAT_MODEL_SMALL: &str = "chat-model-small";
pub const CHAT_MODEL_LARGE: &str = "chat-model-large";
pub const CHAT_MODEL_REASONING: &str = "chat-model-reasoning";
pub const TITLE_MODEL: &str = "title-model";
pub const BLOCK_MODEL: &str = "block-model";
pub const VIDEO_MODEL: &str = "video-model";
pub const IMAGE_MODEL_SMALL: &str = "small-model";

pub const DEFAULT_CHAT_MODEL: &str = CHAT_MODEL_SMALL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatModel {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Chat models offered to users
pub fn chat_models() -> Vec<ChatModel> {
    vec![ChatModel {
        id: VIDEO_MODEL.to_string(),
        name: "Video analysis model".to_string(),
        description: "Specialized model for analyzing video content".to_string(),
    }]
}
