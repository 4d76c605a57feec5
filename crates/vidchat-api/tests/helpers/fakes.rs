//! In-process stand-ins for the remote job service, the session resolver and a
//! language model.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};
use vidchat_api::auth::{SessionResolver, UserSession};
use vidchat_core::models::{JobState, RemoteJob};
use vidchat_core::AppError;
use vidchat_models::{
    CallOptions, EventStream, FinishReason, GenerateOutput, LanguageModel, ModelResult,
    StreamEvent, Usage,
};
use vidchat_services::{RemoteJobService, ServiceResult};

pub const JOB_ID: &str = "files/test-clip";
pub const JOB_URI: &str = "https://generativelanguage.test/v1beta/files/test-clip";

/// Remote jobs whose status follows a script; the last state repeats.
pub struct ScriptedJobs {
    states: Vec<JobState>,
    pub submitted: Mutex<Vec<(usize, String)>>,
    pub polls: Mutex<usize>,
    pub cancelled: Mutex<Vec<String>>,
}

impl ScriptedJobs {
    pub fn new(states: Vec<JobState>) -> Arc<Self> {
        Arc::new(Self {
            states,
            submitted: Mutex::new(Vec::new()),
            polls: Mutex::new(0),
            cancelled: Mutex::new(Vec::new()),
        })
    }

    fn job(state: JobState) -> RemoteJob {
        RemoteJob {
            id: JOB_ID.to_string(),
            state,
            uri: JOB_URI.to_string(),
            mime_type: "video/mp4".to_string(),
            display_name: "clip.mp4".to_string(),
        }
    }

    pub fn poll_count(&self) -> usize {
        *self.polls.lock().unwrap()
    }

    /// Sizes of the submitted payloads
    pub fn submitted_sizes(&self) -> Vec<usize> {
        self.submitted.lock().unwrap().iter().map(|(len, _)| *len).collect()
    }
}

#[async_trait]
impl RemoteJobService for ScriptedJobs {
    async fn submit(
        &self,
        data: Bytes,
        _mime_type: &str,
        display_name: &str,
    ) -> ServiceResult<RemoteJob> {
        self.submitted
            .lock()
            .unwrap()
            .push((data.len(), display_name.to_string()));
        Ok(Self::job(JobState::Processing))
    }

    async fn status(&self, _job_id: &str) -> ServiceResult<RemoteJob> {
        let mut polls = self.polls.lock().unwrap();
        let state = self
            .states
            .get(*polls)
            .or_else(|| self.states.last())
            .copied()
            .unwrap_or(JobState::Processing);
        *polls += 1;
        Ok(Self::job(state))
    }

    async fn cancel(&self, job_id: &str) -> ServiceResult<()> {
        self.cancelled.lock().unwrap().push(job_id.to_string());
        Ok(())
    }
}

/// Treats the bearer token as the user id
pub struct HeaderSessions;

#[async_trait]
impl SessionResolver for HeaderSessions {
    async fn resolve(&self, headers: &HeaderMap) -> Result<UserSession, AppError> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|user| !user.is_empty())
            .map(|user| UserSession {
                user_id: user.to_string(),
                email: None,
            })
            .ok_or_else(|| AppError::Unauthenticated("no bearer token".to_string()))
    }
}

/// Streams the last user message back word by word
pub struct EchoModel;

impl EchoModel {
    fn words(options: &CallOptions) -> Vec<String> {
        options
            .prompt
            .messages()
            .last()
            .map(|m| m.text())
            .unwrap_or_default()
            .split_inclusive(' ')
            .map(String::from)
            .collect()
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    fn provider(&self) -> &str {
        "test"
    }

    fn model_id(&self) -> &str {
        "echo"
    }

    async fn generate(&self, options: CallOptions) -> ModelResult<GenerateOutput> {
        Ok(GenerateOutput {
            text: Self::words(&options).concat(),
            reasoning: None,
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }

    async fn stream(&self, options: CallOptions) -> ModelResult<EventStream> {
        let mut events: Vec<ModelResult<StreamEvent>> = Self::words(&options)
            .into_iter()
            .map(|w| Ok(StreamEvent::text_delta(w)))
            .collect();
        events.push(Ok(StreamEvent::Finish {
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            provider_metadata: None,
        }));
        Ok(Box::pin(stream::iter(events)))
    }
}
