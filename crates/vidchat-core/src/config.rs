//! Configuration module
//!
//! Settings for the HTTP server, blob storage, the upload pipeline, remote job
//! polling and the model providers. Everything is read from the environment
//! (optionally seeded from a `.env` file).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const UPLOAD_SESSION_TTL_SECS: u64 = 3600;
const JOB_POLL_INTERVAL_MS: u64 = 2000;
const JOB_POLL_MAX_ATTEMPTS: u32 = 10;
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_VIDEO_MODEL: &str = "gemini-2.0-flash-exp";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const FIREWORKS_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub auth_secret: String,
}

/// Blob storage settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_path: String,
    pub local_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

/// Upload pipeline settings (validation, chunk sessions, job polling)
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_file_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub temp_dir: PathBuf,
    pub session_ttl_secs: u64,
    pub job_poll_interval_ms: u64,
    pub job_poll_max_attempts: u32,
}

/// Model provider credentials and endpoints
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub google_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_video_model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub fireworks_api_key: Option<String>,
    pub fireworks_base_url: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub providers: ProviderConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = AppConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server.port
    }

    pub fn environment(&self) -> &str {
        &self.inner().server.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().server.cors_origins
    }

    pub fn auth_secret(&self) -> &str {
        &self.inner().server.auth_secret
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage.backend
    }

    pub fn local_storage_path(&self) -> &str {
        &self.inner().storage.local_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.inner().storage.local_base_url
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().storage.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().storage.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().storage.s3_endpoint.as_deref()
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.inner().upload.max_file_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().upload.allowed_content_types
    }

    pub fn upload_temp_dir(&self) -> &PathBuf {
        &self.inner().upload.temp_dir
    }

    pub fn upload_session_ttl(&self) -> Duration {
        Duration::from_secs(self.inner().upload.session_ttl_secs)
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_millis(self.inner().upload.job_poll_interval_ms)
    }

    pub fn job_poll_max_attempts(&self) -> u32 {
        self.inner().upload.job_poll_max_attempts
    }

    pub fn google_api_key(&self) -> Option<&str> {
        self.inner().providers.google_api_key.as_deref()
    }

    pub fn gemini_base_url(&self) -> &str {
        &self.inner().providers.gemini_base_url
    }

    pub fn gemini_video_model(&self) -> &str {
        &self.inner().providers.gemini_video_model
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.inner().providers.openai_api_key.as_deref()
    }

    pub fn openai_base_url(&self) -> &str {
        &self.inner().providers.openai_base_url
    }

    pub fn fireworks_api_key(&self) -> Option<&str> {
        self.inner().providers.fireworks_api_key.as_deref()
    }

    pub fn fireworks_base_url(&self) -> &str {
        &self.inner().providers.fireworks_base_url
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server = ServerConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            auth_secret: env::var("AUTH_SECRET")
                .map_err(|_| anyhow::anyhow!("AUTH_SECRET must be set for session resolution"))?,
        };

        let backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StorageBackend::Local,
        };

        let storage = StorageConfig {
            backend,
            local_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/blobs".to_string()),
            local_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/blobs", server.port)),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").or_else(|_| env::var("AWS_REGION")).ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))?;

        let upload = UploadConfig {
            max_file_size_bytes: max_upload_size_mb * 1024 * 1024,
            allowed_content_types: split_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| "image/jpeg,image/png,video/mp4".to_string()),
            ),
            temp_dir: env::var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("vidchat-uploads")),
            session_ttl_secs: env::var("UPLOAD_SESSION_TTL_SECS")
                .unwrap_or_else(|_| UPLOAD_SESSION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_SESSION_TTL_SECS),
            job_poll_interval_ms: env::var("JOB_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| JOB_POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(JOB_POLL_INTERVAL_MS),
            job_poll_max_attempts: env::var("JOB_POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| JOB_POLL_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(JOB_POLL_MAX_ATTEMPTS),
        };

        let providers = ProviderConfig {
            google_api_key: env::var("GOOGLE_API_KEY").ok(),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| GEMINI_BASE_URL.to_string()),
            gemini_video_model: env::var("GEMINI_VIDEO_MODEL")
                .unwrap_or_else(|_| GEMINI_VIDEO_MODEL.to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| OPENAI_BASE_URL.to_string()),
            fireworks_api_key: env::var("FIREWORKS_API_KEY").ok(),
            fireworks_base_url: env::var("FIREWORKS_BASE_URL")
                .unwrap_or_else(|_| FIREWORKS_BASE_URL.to_string()),
        };

        Ok(AppConfig {
            server,
            storage,
            upload,
            providers,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let env = self.server.environment.to_lowercase();
        let is_production = env == "production" || env == "prod";

        if is_production && self.server.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.server.auth_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "AUTH_SECRET must be at least 32 characters long"
            ));
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB cannot be 0"));
        }

        if self.upload.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES cannot be empty"));
        }

        if self.upload.job_poll_max_attempts == 0 {
            return Err(anyhow::anyhow!("JOB_POLL_MAX_ATTEMPTS must be at least 1"));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.s3_bucket.is_none() {
            return Err(anyhow::anyhow!(
                "S3_BUCKET must be set when STORAGE_BACKEND=s3"
            ));
        }

        Ok(())
    }
}
