//! Video analysis model on Gemini.
//!
//! Stream only. The conversation is redacted and serialized as a single text
//! part, preceded by the processed video (`google.geminiUri`) when the caller
//! supplies one.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use vidchat_core::constants::VIDEO_MP4;
use vidchat_services::{GeminiClient, GenerateContentChunk, ServiceResult};

use crate::error::{ModelError, ModelResult};
use crate::model::{EventStream, LanguageModel};
use crate::redact::redact_prompt;
use crate::types::{CallOptions, FinishReason, GenerateOutput, StreamEvent, Usage};

#[derive(Debug, Clone)]
pub struct GeminiVideoModel {
    client: GeminiClient,
    model: String,
}

impl GeminiVideoModel {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Request body for `streamGenerateContent`
    fn request_body(options: &CallOptions) -> ModelResult<Value> {
        let redacted = redact_prompt(&options.prompt);
        let text = serde_json::to_string_pretty(&redacted)
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        let mut parts = Vec::with_capacity(2);
        if let Some(uri) = options.gemini_uri() {
            parts.push(json!({ "fileData": { "mimeType": VIDEO_MP4, "fileUri": uri } }));
        }
        parts.push(json!({ "text": text }));

        Ok(json!({ "contents": [{ "role": "user", "parts": parts }] }))
    }
}

/// Turn provider chunks into `text-delta` events followed by exactly one `finish`.
///
/// A provider error ends the stream without a `finish` event.
pub fn reframe<S>(chunks: S) -> EventStream
where
    S: Stream<Item = ServiceResult<GenerateContentChunk>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut finish_reason = FinishReason::Stop;
        let mut usage = Usage::default();
        let mut safety_ratings = Value::Null;
        let mut grounding_metadata = Value::Null;

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ModelError::from(e));
                    return;
                }
            };

            let text = chunk.text();
            if !text.is_empty() {
                yield Ok(StreamEvent::text_delta(text));
            }

            if let Some(reason) = chunk.finish_reason() {
                finish_reason = FinishReason::from_gemini(reason);
            }
            if let Some(metadata) = chunk.usage_metadata {
                usage = Usage {
                    prompt_tokens: metadata.prompt_token_count,
                    completion_tokens: metadata.candidates_token_count,
                };
            }
            if let Some(candidate) = chunk.candidates.into_iter().next() {
                if let Some(ratings) = candidate.safety_ratings {
                    safety_ratings = ratings;
                }
                if let Some(grounding) = candidate.grounding_metadata {
                    grounding_metadata = grounding;
                }
            }
        }

        yield Ok(StreamEvent::Finish {
            finish_reason,
            usage,
            provider_metadata: Some(json!({
                "google": {
                    "groundingMetadata": grounding_metadata,
                    "safetyRatings": safety_ratings,
                }
            })),
        });
    })
}

#[async_trait]
impl LanguageModel for GeminiVideoModel {
    fn provider(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, _options: CallOptions) -> ModelResult<GenerateOutput> {
        Err(ModelError::NotSupported {
            model: self.model.clone(),
            operation: "generate",
        })
    }

    #[tracing::instrument(skip(self, options), fields(model = %self.model))]
    async fn stream(&self, options: CallOptions) -> ModelResult<EventStream> {
        let body = Self::request_body(&options)?;

        tracing::debug!(
            gemini_uri = ?options.gemini_uri(),
            messages = options.prompt.messages().len(),
            "Starting video model stream"
        );

        let chunks = self.client.stream_generate_content(&self.model, &body).await?;
        Ok(reframe(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Part, Prompt, Role};
    use futures::stream;
    use vidchat_services::gemini::{Candidate, Content, ContentPart, UsageMetadata};
    use vidchat_services::ServiceError;

    fn text_chunk(text: &str) -> GenerateContentChunk {
        GenerateContentChunk {
            candidates: vec![Candidate {
                content: Some(Content {
                    parts: vec![ContentPart {
                        text: Some(text.to_string()),
                    }],
                }),
                ..Default::default()
            }],
            usage_metadata: None,
        }
    }

    async fn events(chunks: Vec<ServiceResult<GenerateContentChunk>>) -> Vec<ModelResult<StreamEvent>> {
        reframe(stream::iter(chunks)).collect().await
    }

    #[tokio::test]
    async fn test_n_fragments_give_n_deltas_and_one_finish() {
        let out = events(vec![
            Ok(text_chunk("The ")),
            Ok(text_chunk("")),
            Ok(text_chunk("video ")),
            Ok(text_chunk("shows a cat.")),
        ])
        .await;

        let out: Vec<StreamEvent> = out.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], StreamEvent::text_delta("The "));
        assert_eq!(out[2], StreamEvent::text_delta("shows a cat."));
        match &out[3] {
            StreamEvent::Finish {
                finish_reason,
                usage,
                provider_metadata,
            } => {
                assert_eq!(*finish_reason, FinishReason::Stop);
                assert_eq!(*usage, Usage::default());
                let google = &provider_metadata.as_ref().unwrap()["google"];
                assert!(google["groundingMetadata"].is_null());
                assert!(google["safetyRatings"].is_null());
            }
            other => panic!("expected finish, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reported_usage_and_reason_are_used() {
        let mut last = text_chunk("done");
        last.candidates[0].finish_reason = Some("MAX_TOKENS".to_string());
        last.usage_metadata = Some(UsageMetadata {
            prompt_token_count: Some(1200),
            candidates_token_count: Some(40),
            total_token_count: Some(1240),
        });

        let out = events(vec![Ok(last)]).await;
        match out.last().unwrap().as_ref().unwrap() {
            StreamEvent::Finish {
                finish_reason,
                usage,
                ..
            } => {
                assert_eq!(*finish_reason, FinishReason::Length);
                assert_eq!(usage.prompt_tokens, Some(1200));
                assert_eq!(usage.completion_tokens, Some(40));
            }
            other => panic!("expected finish, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_ends_stream_without_finish() {
        let out = events(vec![
            Ok(text_chunk("partial")),
            Err(ServiceError::Stream("connection reset".to_string())),
            Ok(text_chunk("never")),
        ])
        .await;

        assert_eq!(out.len(), 2);
        assert!(out[1].is_err());
    }

    #[tokio::test]
    async fn test_generate_is_not_supported() {
        let client = GeminiClient::new(Some("k".to_string()), "http://127.0.0.1:1").unwrap();
        let model = GeminiVideoModel::new(client, "gemini-2.0-flash-exp");
        let err = model.generate(CallOptions::default()).await.unwrap_err();
        assert!(matches!(err, ModelError::NotSupported { operation: "generate", .. }));
    }

    #[test]
    fn test_request_body_references_video_and_redacts() {
        let mut options = CallOptions::new(Prompt(vec![Message {
            role: Role::User,
            content: vec![
                Part::text("summarize"),
                Part::File {
                    data: Some("BASE64VIDEO".to_string()),
                    url: Some("https://blobs/clip.mp4".to_string()),
                    mime_type: "video/mp4".to_string(),
                    filename: None,
                },
            ],
        }]));
        options.provider_metadata = Some(json!({ "google": { "geminiUri": "https://gemini/files/abc" } }));

        let body = GeminiVideoModel::request_body(&options).unwrap();
        let parts = &body["contents"][0]["parts"];

        assert_eq!(parts[0]["fileData"]["mimeType"], "video/mp4");
        assert_eq!(parts[0]["fileData"]["fileUri"], "https://gemini/files/abc");
        let text = parts[1]["text"].as_str().unwrap();
        assert!(text.contains("summarize"));
        assert!(text.contains("https://blobs/clip.mp4"));
        assert!(!text.contains("BASE64VIDEO"));
    }

    #[test]
    fn test_request_body_without_video() {
        let options = CallOptions::new(Prompt(vec![Message::user_text("hello")]));
        let body = GeminiVideoModel::request_body(&options).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].get("text").is_some());
    }
}
