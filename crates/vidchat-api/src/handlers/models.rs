//! Thin HTTP surface over the model registry.

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use utoipa::ToSchema;
use vidchat_core::{AppError, ErrorMetadata};
use vidchat_models::{
    chat_models, redact_prompt, CallOptions, ChatModel, GenerateOutput, GeneratedImage,
    StreamEvent, DEFAULT_CHAT_MODEL,
};

use crate::auth::UserSession;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub default_model: String,
    pub chat_models: Vec<ChatModel>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    #[serde(default = "default_image_count")]
    pub n: u32,
    #[serde(default)]
    pub size: Option<String>,
}

fn default_image_count() -> u32 {
    1
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageGenerationResponse {
    pub images: Vec<GeneratedImage>,
}

/// List the chat models users can pick
#[utoipa::path(
    get,
    path = "/api/models",
    tag = "models",
    responses(
        (status = 200, description = "Selectable chat models", body = ModelsResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    )
)]
pub async fn list_models(_session: UserSession) -> impl IntoResponse {
    Json(ModelsResponse {
        default_model: DEFAULT_CHAT_MODEL.to_string(),
        chat_models: chat_models(),
    })
}

/// Stream a generation as server-sent events
#[utoipa::path(
    post,
    path = "/api/models/{id}/stream",
    tag = "models",
    params(("id" = String, Path, description = "Logical model id")),
    request_body = CallOptions,
    responses(
        (status = 200, description = "text/event-stream of stream events", body = StreamEvent),
        (status = 404, description = "Unknown model", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, options), fields(user_id = %session.user_id))]
pub async fn stream_model(
    State(state): State<Arc<AppState>>,
    session: UserSession,
    Path(id): Path<String>,
    ValidatedJson(options): ValidatedJson<CallOptions>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HttpAppError> {
    let model = state.models.language_model(&id)?;

    tracing::debug!(
        provider = model.provider(),
        model_id = model.model_id(),
        prompt = ?redact_prompt(&options.prompt),
        "Streaming generation"
    );

    let events = model.stream(options).await?;
    let events = events.map(move |event| {
        let sse = match event {
            Ok(event) => to_sse(&event),
            Err(e) => {
                let err = AppError::from(e);
                tracing::warn!(model = %id, error = %err, "Generation stream failed");
                Event::default().event("error").data(err.client_message())
            }
        };
        Ok::<_, Infallible>(sse)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &StreamEvent) -> Event {
    match Event::default().json_data(event) {
        Ok(sse) => sse,
        Err(e) => Event::default().event("error").data(e.to_string()),
    }
}

/// Generate a complete response in one call
#[utoipa::path(
    post,
    path = "/api/models/{id}/generate",
    tag = "models",
    params(("id" = String, Path, description = "Logical model id")),
    request_body = CallOptions,
    responses(
        (status = 200, description = "Generated text", body = GenerateOutput),
        (status = 404, description = "Unknown model", body = ErrorResponse),
        (status = 501, description = "Model only supports streaming", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, options), fields(user_id = %session.user_id))]
pub async fn generate_model(
    State(state): State<Arc<AppState>>,
    session: UserSession,
    Path(id): Path<String>,
    ValidatedJson(options): ValidatedJson<CallOptions>,
) -> Result<Json<GenerateOutput>, HttpAppError> {
    let model = state.models.language_model(&id)?;
    let output = model.generate(options).await?;
    Ok(Json(output))
}

/// Generate images with an image model
#[utoipa::path(
    post,
    path = "/api/models/{id}/images",
    tag = "models",
    params(("id" = String, Path, description = "Logical image model id")),
    request_body = ImageGenerationRequest,
    responses(
        (status = 200, description = "Generated images", body = ImageGenerationResponse),
        (status = 404, description = "Unknown model", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
pub async fn generate_images(
    State(state): State<Arc<AppState>>,
    session: UserSession,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<ImageGenerationRequest>,
) -> Result<Json<ImageGenerationResponse>, HttpAppError> {
    if request.n == 0 || request.n > 4 {
        return Err(AppError::InvalidInput("n must be between 1 and 4".to_string()).into());
    }

    let model = state.models.image_model(&id)?;
    let images = model
        .generate_images(&request.prompt, request.n, request.size.as_deref())
        .await?;
    Ok(Json(ImageGenerationResponse { images }))
}
