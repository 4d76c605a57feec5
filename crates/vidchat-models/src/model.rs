//! Capabilities a routed model can offer.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::ModelResult;
use crate::types::{CallOptions, GenerateOutput, GeneratedImage, StreamEvent};

/// Stream of generation events; ends after a `finish` event or an error
pub type EventStream = Pin<Box<dyn Stream<Item = ModelResult<StreamEvent>> + Send>>;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name, e.g. "openai"
    fn provider(&self) -> &str;

    /// Provider-side model id, e.g. "gpt-4o-mini"
    fn model_id(&self) -> &str;

    /// Generate a complete response in one call
    async fn generate(&self, options: CallOptions) -> ModelResult<GenerateOutput>;

    /// Generate a response as a stream of events
    async fn stream(&self, options: CallOptions) -> ModelResult<EventStream>;
}

#[async_trait]
pub trait ImageModel: Send + Sync {
    fn provider(&self) -> &str;

    fn model_id(&self) -> &str;

    async fn generate_images(
        &self,
        prompt: &str,
        n: u32,
        size: Option<&str>,
    ) -> ModelResult<Vec<GeneratedImage>>;
}
