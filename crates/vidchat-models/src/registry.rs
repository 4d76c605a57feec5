//! Registry of routable models

use std::collections::HashMap;
use std::sync::Arc;
use vidchat_core::Config;
use vidchat_services::GeminiClient;

use crate::catalog::{
    BLOCK_MODEL, CHAT_MODEL_LARGE, CHAT_MODEL_REASONING, CHAT_MODEL_SMALL, IMAGE_MODEL_SMALL,
    TITLE_MODEL, VIDEO_MODEL,
};
use crate::error::{ModelError, ModelResult};
use crate::model::{ImageModel, LanguageModel};
use crate::providers::{GeminiVideoModel, OpenAiCompatibleProvider, OpenAiImageModel};
use crate::reasoning::ExtractReasoning;

/// Maps logical model ids to concrete models.
///
/// Built once at startup and shared read-only, so lookups take no lock.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    language_models: HashMap<String, Arc<dyn LanguageModel>>,
    image_models: HashMap<String, Arc<dyn ImageModel>>,
}

impl ModelRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard model table.
    ///
    /// Missing API keys do not fail construction; calls to the affected
    /// models fail with `MissingApiKey` instead.
    pub fn from_config(config: &Config) -> ModelResult<Self> {
        let openai = OpenAiCompatibleProvider::openai(
            config.openai_api_key().map(String::from),
            config.openai_base_url(),
        )?;
        let fireworks = OpenAiCompatibleProvider::fireworks(
            config.fireworks_api_key().map(String::from),
            config.fireworks_base_url(),
        )?;
        let gemini = GeminiClient::new(
            config.google_api_key().map(String::from),
            config.gemini_base_url(),
        )?;

        let reasoning = ExtractReasoning::new(
            Arc::new(fireworks.chat("accounts/fireworks/models/deepseek-r1")),
            "think",
        );

        let registry = Self::new()
            .with_language_model(CHAT_MODEL_SMALL, Arc::new(openai.chat("gpt-4o-mini")))
            .with_language_model(CHAT_MODEL_LARGE, Arc::new(openai.chat("gpt-4o")))
            .with_language_model(CHAT_MODEL_REASONING, Arc::new(reasoning))
            .with_language_model(TITLE_MODEL, Arc::new(openai.chat("gpt-4-turbo")))
            .with_language_model(BLOCK_MODEL, Arc::new(openai.chat("gpt-4o-mini")))
            .with_language_model(
                VIDEO_MODEL,
                Arc::new(GeminiVideoModel::new(gemini, config.gemini_video_model())),
            )
            .with_image_model(
                IMAGE_MODEL_SMALL,
                Arc::new(OpenAiImageModel::new(openai, "dall-e-3")),
            );

        tracing::info!(
            language_models = registry.language_models.len(),
            image_models = registry.image_models.len(),
            "Model registry initialized"
        );

        Ok(registry)
    }

    pub fn with_language_model(
        mut self,
        id: impl Into<String>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        self.language_models.insert(id.into(), model);
        self
    }

    pub fn with_image_model(mut self, id: impl Into<String>, model: Arc<dyn ImageModel>) -> Self {
        self.image_models.insert(id.into(), model);
        self
    }

    pub fn language_model(&self, id: &str) -> ModelResult<Arc<dyn LanguageModel>> {
        self.language_models
            .get(id)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModel(id.to_string()))
    }

    pub fn image_model(&self, id: &str) -> ModelResult<Arc<dyn ImageModel>> {
        self.image_models
            .get(id)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModel(id.to_string()))
    }

    /// Registered language model ids, sorted
    pub fn language_model_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.language_models.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidchat_core::config::{
        AppConfig, ProviderConfig, ServerConfig, StorageConfig, UploadConfig,
    };
    use vidchat_core::StorageBackend;

    fn config() -> Config {
        Config(Box::new(AppConfig {
            server: ServerConfig {
                port: 3000,
                environment: "test".to_string(),
                cors_origins: vec!["*".to_string()],
                auth_secret: "0123456789abcdef0123456789abcdef".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Local,
                local_path: "./data/blobs".to_string(),
                local_base_url: "http://localhost:3000/blobs".to_string(),
                s3_bucket: None,
                s3_region: None,
                s3_endpoint: None,
            },
            upload: UploadConfig {
                max_file_size_bytes: 50 * 1024 * 1024,
                allowed_content_types: vec!["video/mp4".to_string()],
                temp_dir: std::env::temp_dir(),
                session_ttl_secs: 3600,
                job_poll_interval_ms: 2000,
                job_poll_max_attempts: 10,
            },
            providers: ProviderConfig {
                google_api_key: None,
                gemini_base_url: "http://127.0.0.1:1".to_string(),
                gemini_video_model: "gemini-2.0-flash-exp".to_string(),
                openai_api_key: None,
                openai_base_url: "http://127.0.0.1:1".to_string(),
                fireworks_api_key: None,
                fireworks_base_url: "http://127.0.0.1:1".to_string(),
            },
        }))
    }

    #[test]
    fn test_standard_table() {
        let registry = ModelRegistry::from_config(&config()).unwrap();

        assert_eq!(
            registry.language_model_ids(),
            vec![
                "block-model",
                "chat-model-large",
                "chat-model-reasoning",
                "chat-model-small",
                "title-model",
                "video-model",
            ]
        );

        let small = registry.language_model("chat-model-small").unwrap();
        assert_eq!(small.provider(), "openai");
        assert_eq!(small.model_id(), "gpt-4o-mini");

        let reasoning = registry.language_model("chat-model-reasoning").unwrap();
        assert_eq!(reasoning.provider(), "fireworks");
        assert_eq!(reasoning.model_id(), "accounts/fireworks/models/deepseek-r1");

        let video = registry.language_model("video-model").unwrap();
        assert_eq!(video.provider(), "google");
        assert_eq!(video.model_id(), "gemini-2.0-flash-exp");

        let image = registry.image_model("small-model").unwrap();
        assert_eq!(image.model_id(), "dall-e-3");
    }

    #[test]
    fn test_unknown_model() {
        let registry = ModelRegistry::new();
        assert!(matches!(
            registry.language_model("gpt-5"),
            Err(ModelError::UnknownModel(id)) if id == "gpt-5"
        ));
    }
}
