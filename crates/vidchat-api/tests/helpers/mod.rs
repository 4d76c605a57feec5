//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p vidchat-api`. Remote jobs, sessions and
//! models are in-process fakes; blobs and chunk files go to a temp directory.

#![allow(dead_code)]

pub mod auth;
pub mod fakes;
pub mod fixtures;

use axum_test::TestServer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vidchat_api::setup::routes;
use vidchat_api::state::{AppState, UploadState};
use vidchat_api::upload::UploadSessionStore;
use vidchat_core::config::{AppConfig, ProviderConfig, ServerConfig, StorageConfig, UploadConfig};
use vidchat_core::models::JobState;
use vidchat_core::{Config, FileSchema, StorageBackend};
use vidchat_models::providers::GeminiVideoModel;
use vidchat_models::ModelRegistry;
use vidchat_services::{GeminiClient, PollPolicy};
use vidchat_storage::LocalStorage;

use fakes::{EchoModel, HeaderSessions, ScriptedJobs};

pub const MB: usize = 1024 * 1024;

/// Test application: server plus the fakes and directories behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub jobs: Arc<ScriptedJobs>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Directory holding chunk backing files
    pub fn parts_dir(&self) -> &Path {
        self.state.upload.sessions.temp_dir()
    }

    /// Number of chunk backing files still on disk
    pub fn leftover_parts(&self) -> usize {
        std::fs::read_dir(self.parts_dir())
            .map(|dir| dir.count())
            .unwrap_or(0)
    }
}

pub fn test_config(temp_dir: &Path, max_file_size_bytes: u64) -> Config {
    Config(Box::new(AppConfig {
        server: ServerConfig {
            port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            auth_secret: "test-secret-at-least-32-characters-long".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_path: temp_dir.join("blobs").display().to_string(),
            local_base_url: "http://localhost:3000/blobs".to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
        },
        upload: UploadConfig {
            max_file_size_bytes,
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "video/mp4".to_string(),
            ],
            temp_dir: temp_dir.join("parts"),
            session_ttl_secs: 3600,
            job_poll_interval_ms: 1,
            job_poll_max_attempts: 10,
        },
        providers: ProviderConfig {
            google_api_key: Some("test-key".to_string()),
            gemini_base_url: "http://127.0.0.1:1".to_string(),
            gemini_video_model: "gemini-2.0-flash-exp".to_string(),
            openai_api_key: None,
            openai_base_url: "http://127.0.0.1:1".to_string(),
            fireworks_api_key: None,
            fireworks_base_url: "http://127.0.0.1:1".to_string(),
        },
    }))
}

/// Registry with the real (stream-only) video model and an in-process chat model
fn test_registry(config: &Config) -> ModelRegistry {
    let gemini = GeminiClient::new(
        config.google_api_key().map(String::from),
        config.gemini_base_url(),
    )
    .expect("Failed to build Gemini client");

    ModelRegistry::new()
        .with_language_model(
            "video-model",
            Arc::new(GeminiVideoModel::new(gemini, config.gemini_video_model())),
        )
        .with_language_model("chat-model-small", Arc::new(EchoModel))
}

/// Setup test app whose remote jobs report `job_states` in order (the last repeats).
pub async fn setup_test_app(job_states: Vec<JobState>) -> TestApp {
    setup_test_app_with_limit(job_states, 50 * MB as u64).await
}

pub async fn setup_test_app_with_limit(job_states: Vec<JobState>, max_bytes: u64) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(temp_dir.path(), max_bytes);

    let storage = LocalStorage::new(
        PathBuf::from(config.local_storage_path()),
        config.local_storage_base_url().to_string(),
    )
    .await
    .expect("Failed to create local storage");

    let jobs = ScriptedJobs::new(job_states);

    let state = Arc::new(AppState {
        config: config.clone(),
        upload: UploadState {
            storage: Arc::new(storage),
            jobs: jobs.clone(),
            sessions: UploadSessionStore::new(
                config.upload_temp_dir(),
                Duration::from_secs(3600),
            ),
            schema: Arc::new(FileSchema::for_uploads(
                config.max_file_size_bytes(),
                config.allowed_content_types(),
            )),
            poll_policy: PollPolicy {
                interval: config.job_poll_interval(),
                max_attempts: config.job_poll_max_attempts(),
            },
        },
        models: test_registry(&config),
        session_resolver: Arc::new(HeaderSessions),
        shutdown: CancellationToken::new(),
    });

    let app = routes::setup_routes(&config, state.clone())
        .await
        .expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        jobs,
        _temp_dir: temp_dir,
    }
}
