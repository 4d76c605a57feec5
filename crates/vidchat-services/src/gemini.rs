//! Gemini REST client
//!
//! Covers the two API surfaces the backend needs: the files API (resumable
//! upload, status, delete) used for video processing jobs, and
//! `streamGenerateContent` used by the video model.

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::pin::Pin;
use std::time::Duration;
use vidchat_core::models::{JobState, RemoteJob};

use crate::error::{ServiceError, ServiceResult};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Stream of decoded `streamGenerateContent` chunks
pub type GenerateContentStream =
    Pin<Box<dyn Stream<Item = ServiceResult<GenerateContentChunk>> + Send>>;

#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl Debug for GeminiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> ServiceResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(300)) // uploads of up to 50MB and long generations
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn api_key(&self) -> ServiceResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ServiceError::MissingApiKey("GOOGLE_API_KEY"))
    }

    /// Upload bytes through the resumable files protocol and return the created file
    pub async fn upload_file(
        &self,
        data: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> ServiceResult<RemoteJob> {
        let api_key = self.api_key()?;
        let size = data.len();

        let start_response = self
            .http_client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;

        if !start_response.status().is_success() {
            return Err(ServiceError::from_response(start_response).await);
        }

        let upload_url = start_response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                ServiceError::Decode(format!("missing {} header", UPLOAD_URL_HEADER))
            })?;

        let response = self
            .http_client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let envelope: FileEnvelope = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        tracing::info!(
            file_name = %envelope.file.name,
            size_bytes = size,
            state = envelope.file.state.as_str(),
            "Gemini file uploaded"
        );

        Ok(envelope.file.into())
    }

    /// Fetch the current state of a file (`name` is e.g. "files/abc123")
    pub async fn get_file(&self, name: &str) -> ServiceResult<RemoteJob> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let file: GeminiFile = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        if let (JobState::Failed, Some(err)) = (file.state, file.error.as_ref()) {
            tracing::warn!(file_name = %file.name, reason = %err.message, "Gemini file processing failed");
        }

        Ok(file.into())
    }

    pub async fn delete_file(&self, name: &str) -> ServiceResult<()> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        // Already gone counts as deleted
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        tracing::info!(file_name = %name, "Gemini file deleted");
        Ok(())
    }

    /// Call `models/{model}:streamGenerateContent` and decode its SSE response
    pub async fn stream_generate_content(
        &self,
        model: &str,
        request: &Value,
    ) -> ServiceResult<GenerateContentStream> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .post(format!(
                "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
                self.base_url, model
            ))
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(
                        serde_json::from_str::<GenerateContentChunk>(&event.data)
                            .map_err(|e| ServiceError::Decode(e.to_string())),
                    ),
                    Err(e) => Some(Err(ServiceError::Stream(e.to_string()))),
                }
            });

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    state: JobState,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    display_name: String,
    error: Option<GeminiStatus>,
}

#[derive(Debug, Deserialize)]
struct GeminiStatus {
    #[serde(default)]
    message: String,
}

impl From<GeminiFile> for RemoteJob {
    fn from(file: GeminiFile) -> Self {
        RemoteJob {
            id: file.name,
            state: file.state,
            uri: file.uri,
            mime_type: file.mime_type,
            display_name: file.display_name,
        }
    }
}

/// One SSE payload of `streamGenerateContent`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub safety_ratings: Option<Value>,
    pub grounding_metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

impl GenerateContentChunk {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }
}
