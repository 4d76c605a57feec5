//! OpenAI image generation (`images/generations`).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::openai::OpenAiCompatibleProvider;
use crate::error::{ModelError, ModelResult};
use crate::model::ImageModel;
use crate::types::GeneratedImage;

#[derive(Debug, Clone)]
pub struct OpenAiImageModel {
    provider: OpenAiCompatibleProvider,
    model: String,
}

impl OpenAiImageModel {
    pub fn new(provider: OpenAiCompatibleProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

#[async_trait]
impl ImageModel for OpenAiImageModel {
    fn provider(&self) -> &str {
        self.provider.name()
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate_images(
        &self,
        prompt: &str,
        n: u32,
        size: Option<&str>,
    ) -> ModelResult<Vec<GeneratedImage>> {
        let api_key = self.provider.api_key()?;

        let response = self
            .provider
            .http()
            .post(self.provider.url("images/generations"))
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "n": n,
                "size": size.unwrap_or("1024x1024"),
                "response_format": "b64_json",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::from_response(response).await);
        }

        let images: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        images
            .data
            .into_iter()
            .map(|image| {
                let base64 = image
                    .b64_json
                    .ok_or_else(|| ModelError::Decode("image without b64_json".to_string()))?;
                Ok(GeneratedImage {
                    base64,
                    revised_prompt: image.revised_prompt,
                })
            })
            .collect()
    }
}
