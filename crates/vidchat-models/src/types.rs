//! Typed conversation and stream event model shared by every provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One piece of message content
///
/// Binary parts may carry inline base64 `data`; [`crate::redact_prompt`] strips it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    Text {
        text: String,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(
            rename = "mimeType",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        mime_type: Option<String>,
    },
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Part>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![Part::text(text)],
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The conversation handed to a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Prompt(pub Vec<Message>);

impl Prompt {
    pub fn messages(&self) -> &[Message] {
        &self.0
    }
}

/// Everything a single model call receives
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallOptions {
    pub prompt: Prompt,
    /// Provider-keyed extras, e.g. `{"google": {"geminiUri": "..."}}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub provider_metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CallOptions {
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            ..Default::default()
        }
    }

    /// Remote video reference under `google.geminiUri` (or the older
    /// `google.experimental_geminiUri`)
    pub fn gemini_uri(&self) -> Option<&str> {
        let google = self.provider_metadata.as_ref()?.get("google")?;
        google
            .get("geminiUri")
            .or_else(|| google.get("experimental_geminiUri"))
            .and_then(Value::as_str)
            .filter(|uri| !uri.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    Other,
}

impl FinishReason {
    /// Map an OpenAI-style `finish_reason`
    pub fn from_openai(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            _ => FinishReason::Other,
        }
    }

    /// Map a Gemini `finishReason`
    pub fn from_gemini(reason: &str) -> Self {
        match reason {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Other,
        }
    }
}

/// Token accounting; counts are `null` when the provider did not report them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

/// Events of a streamed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    TextDelta {
        #[serde(rename = "textDelta")]
        text_delta: String,
    },
    Reasoning {
        #[serde(rename = "textDelta")]
        text_delta: String,
    },
    Finish {
        #[serde(rename = "finishReason")]
        finish_reason: FinishReason,
        usage: Usage,
        #[serde(rename = "providerMetadata")]
        #[schema(value_type = Option<Object>)]
        provider_metadata: Option<Value>,
    },
}

impl StreamEvent {
    pub fn text_delta(text: impl Into<String>) -> Self {
        StreamEvent::TextDelta {
            text_delta: text.into(),
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        StreamEvent::Reasoning {
            text_delta: text.into(),
        }
    }
}

/// Result of a single-shot generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// An image produced by an image model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// Base64-encoded image bytes
    pub base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_event_wire_shape() {
        let delta = serde_json::to_value(StreamEvent::text_delta("hi")).unwrap();
        assert_eq!(delta, json!({ "type": "text-delta", "textDelta": "hi" }));

        let finish = serde_json::to_value(StreamEvent::Finish {
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            provider_metadata: None,
        })
        .unwrap();
        assert_eq!(
            finish,
            json!({
                "type": "finish",
                "finishReason": "stop",
                "usage": { "promptTokens": null, "completionTokens": null },
                "providerMetadata": null
            })
        );
    }

    #[test]
    fn test_prompt_parses_parts() {
        let prompt: Prompt = serde_json::from_value(json!([
            { "role": "system", "content": [{ "type": "text", "text": "be brief" }] },
            { "role": "user", "content": [
                { "type": "text", "text": "what happens?" },
                { "type": "file", "mimeType": "video/mp4", "url": "https://blobs/clip.mp4", "data": "AAAA" }
            ]}
        ]))
        .unwrap();

        assert_eq!(prompt.messages().len(), 2);
        assert_eq!(prompt.messages()[1].text(), "what happens?");
        assert!(matches!(
            &prompt.messages()[1].content[1],
            Part::File { data: Some(_), .. }
        ));
    }

    #[test]
    fn test_gemini_uri_lookup() {
        let mut options = CallOptions::new(Prompt::default());
        assert_eq!(options.gemini_uri(), None);

        options.provider_metadata = Some(json!({ "google": { "experimental_geminiUri": "files/a" } }));
        assert_eq!(options.gemini_uri(), Some("files/a"));

        options.provider_metadata = Some(json!({ "google": { "geminiUri": "files/b" } }));
        assert_eq!(options.gemini_uri(), Some("files/b"));
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_gemini("MAX_TOKENS"), FinishReason::Length);
        assert_eq!(FinishReason::from_gemini("SAFETY"), FinishReason::ContentFilter);
        assert_eq!(FinishReason::from_openai("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_openai("weird"), FinishReason::Other);
    }
}
