//! Concrete provider adapters

pub mod gemini_video;
pub mod openai;
pub mod openai_image;

pub use gemini_video::GeminiVideoModel;
pub use openai::{OpenAiChatModel, OpenAiCompatibleProvider};
pub use openai_image::OpenAiImageModel;
