//! Vidchat Model Router
//!
//! Maps logical model ids ("chat-model-small", "video-model", ...) to concrete
//! provider calls. The [`ModelRegistry`] is built once from configuration and
//! injected into request handling; tests build their own with fake models.

pub mod catalog;
pub mod error;
pub mod model;
pub mod providers;
pub mod reasoning;
pub mod redact;
pub mod registry;
pub mod types;

pub use catalog::{chat_models, ChatModel, DEFAULT_CHAT_MODEL};
pub use error::{ModelError, ModelResult};
pub use model::{EventStream, ImageModel, LanguageModel};
pub use reasoning::{ExtractReasoning, ReasoningExtractor};
pub use redact::redact_prompt;
pub use registry::ModelRegistry;
pub use types::{
    CallOptions, FinishReason, GenerateOutput, GeneratedImage, Message, Part, Prompt, Role,
    StreamEvent, Usage,
};
