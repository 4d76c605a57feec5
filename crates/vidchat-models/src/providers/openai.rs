//! OpenAI-compatible chat completions (OpenAI and Fireworks).

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::error::{ModelError, ModelResult};
use crate::model::{EventStream, LanguageModel};
use crate::types::{
    CallOptions, FinishReason, GenerateOutput, Message, Part, Role, StreamEvent, Usage,
};

/// Connection settings shared by every model of one provider
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    http_client: Client,
    name: &'static str,
    key_var: &'static str,
    api_key: Option<String>,
    base_url: String,
}

impl Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    /// `key_var` names the environment variable reported when the key is missing
    pub fn new(
        name: &'static str,
        key_var: &'static str,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> ModelResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            http_client,
            name,
            key_var,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn openai(api_key: Option<String>, base_url: impl Into<String>) -> ModelResult<Self> {
        Self::new("openai", "OPENAI_API_KEY", api_key, base_url)
    }

    pub fn fireworks(api_key: Option<String>, base_url: impl Into<String>) -> ModelResult<Self> {
        Self::new("fireworks", "FIREWORKS_API_KEY", api_key, base_url)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn api_key(&self) -> ModelResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ModelError::MissingApiKey(self.key_var))
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    pub fn chat(&self, model: impl Into<String>) -> OpenAiChatModel {
        OpenAiChatModel {
            provider: self.clone(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    provider: OpenAiCompatibleProvider,
    model: String,
}

impl OpenAiChatModel {
    fn request_body(&self, options: &CallOptions, stream: bool) -> Value {
        let messages: Vec<Value> = options.prompt.messages().iter().map(to_wire_message).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        });
        if stream {
            body["stream_options"] = json!({ "include_usage": true });
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    async fn send(&self, body: &Value) -> ModelResult<reqwest::Response> {
        let api_key = self.provider.api_key()?;

        let response = self
            .provider
            .http()
            .post(self.provider.url("chat/completions"))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::from_response(response).await);
        }
        Ok(response)
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

/// Convert a typed message to the chat completions wire format
fn to_wire_message(message: &Message) -> Value {
    if message.role != Role::User {
        return json!({ "role": role_name(message.role), "content": message.text() });
    }

    let content: Vec<Value> = message
        .content
        .iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(json!({ "type": "text", "text": text })),
            Part::Image {
                data,
                url,
                mime_type,
            } => {
                let url = match (url, data) {
                    (Some(url), _) => url.clone(),
                    (None, Some(data)) => format!(
                        "data:{};base64,{}",
                        mime_type.as_deref().unwrap_or("image/png"),
                        data
                    ),
                    (None, None) => return None,
                };
                Some(json!({ "type": "image_url", "image_url": { "url": url } }))
            }
            Part::File { mime_type, .. } => {
                tracing::debug!(mime_type = %mime_type, "Skipping file part unsupported by chat completions");
                None
            }
        })
        .collect();

    json!({ "role": "user", "content": content })
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

impl From<WireUsage> for Usage {
    fn from(usage: WireUsage) -> Self {
        Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    fn provider(&self) -> &str {
        self.provider.name()
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, options: CallOptions) -> ModelResult<GenerateOutput> {
        let response = self.send(&self.request_body(&options, false)).await?;

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Decode("response has no choices".to_string()))?;

        Ok(GenerateOutput {
            text: choice.message.content.unwrap_or_default(),
            reasoning: None,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .map(FinishReason::from_openai)
                .unwrap_or(FinishReason::Stop),
            usage: completion.usage.map(Usage::from).unwrap_or_default(),
        })
    }

    async fn stream(&self, options: CallOptions) -> ModelResult<EventStream> {
        let response = self.send(&self.request_body(&options, true)).await?;
        let mut events = response.bytes_stream().eventsource();

        let stream = async_stream::stream! {
            let mut finish_reason = FinishReason::Stop;
            let mut usage = Usage::default();

            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(ModelError::Decode(e.to_string()));
                        return;
                    }
                };
                let data = event.data.trim();
                if data == "[DONE]" {
                    break;
                }
                if data.is_empty() {
                    continue;
                }

                let chunk: StreamChunk = match serde_json::from_str(data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ModelError::Decode(e.to_string()));
                        return;
                    }
                };

                if let Some(wire) = chunk.usage {
                    usage = wire.into();
                }
                for choice in chunk.choices {
                    if let Some(reason) = choice.finish_reason.as_deref() {
                        finish_reason = FinishReason::from_openai(reason);
                    }
                    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                        yield Ok(StreamEvent::text_delta(text));
                    }
                }
            }

            yield Ok(StreamEvent::Finish {
                finish_reason,
                usage,
                provider_metadata: None,
            });
        };

        Ok(Box::pin(stream))
    }
}
