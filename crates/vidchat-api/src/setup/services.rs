//! Construction of the shared application state

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vidchat_core::{Config, FileSchema};
use vidchat_models::ModelRegistry;
use vidchat_services::{GeminiClient, PollPolicy};
use vidchat_storage::Storage;

use crate::auth::JwtSessionResolver;
use crate::state::{AppState, UploadState};
use crate::upload::UploadSessionStore;

/// How often idle upload sessions are looked for
const REAPER_INTERVAL: Duration = Duration::from_secs(60);

pub fn initialize_services(config: &Config, storage: Arc<dyn Storage>) -> Result<Arc<AppState>> {
    let jobs = GeminiClient::new(
        config.google_api_key().map(String::from),
        config.gemini_base_url(),
    )
    .context("Failed to build Gemini client")?;

    let models = ModelRegistry::from_config(config).context("Failed to build model registry")?;

    let sessions = UploadSessionStore::new(config.upload_temp_dir(), config.upload_session_ttl());
    let schema = FileSchema::for_uploads(config.max_file_size_bytes(), config.allowed_content_types());
    let poll_policy = PollPolicy {
        interval: config.job_poll_interval(),
        max_attempts: config.job_poll_max_attempts(),
    };

    let shutdown = CancellationToken::new();
    let reaper_interval = REAPER_INTERVAL
        .min(config.upload_session_ttl())
        .max(Duration::from_secs(1));
    sessions.spawn_reaper(reaper_interval, shutdown.clone());

    tracing::info!(
        temp_dir = %config.upload_temp_dir().display(),
        session_ttl_secs = config.upload_session_ttl().as_secs(),
        "Upload session store initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        upload: UploadState {
            storage,
            jobs: Arc::new(jobs),
            sessions,
            schema: Arc::new(schema),
            poll_policy,
        },
        models,
        session_resolver: Arc::new(JwtSessionResolver::new(config.auth_secret())),
        shutdown,
    }))
}
