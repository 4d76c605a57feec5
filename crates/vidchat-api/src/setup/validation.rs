//! Configuration validation
//!
//! Checks critical configuration values at startup so misconfigurations fail fast.

use anyhow::Result;
use vidchat_core::{Config, StorageBackend};

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    config.validate()?;

    if config.google_api_key().is_none() {
        tracing::warn!("GOOGLE_API_KEY not set - video uploads and video-model will fail");
    }
    if config.openai_api_key().is_none() {
        tracing::warn!("OPENAI_API_KEY not set - OpenAI-backed models will fail");
    }
    if config.fireworks_api_key().is_none() {
        tracing::warn!("FIREWORKS_API_KEY not set - chat-model-reasoning will fail");
    }

    if config.storage_backend() == StorageBackend::Local && is_production {
        tracing::warn!("Local storage backend in production - blobs live on this host only");
    }

    let max_mb = config.max_file_size_bytes() / 1024 / 1024;
    if max_mb > 1024 {
        tracing::warn!(max_mb, "MAX_UPLOAD_SIZE_MB is very high - uploads are buffered in memory");
    }

    Ok(())
}
