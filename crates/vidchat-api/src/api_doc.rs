//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vidchat_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vidchat API",
        version = "0.1.0",
        description = "Chat backend: file uploads (single-shot and chunked) with remote video processing, and a model router with streaming generation."
    ),
    paths(
        handlers::file_upload::upload_file,
        handlers::models::list_models,
        handlers::models::stream_model,
        handlers::models::generate_model,
        handlers::models::generate_images,
    ),
    components(schemas(
        error::ErrorResponse,
        models::StoredObject,
        models::UploadResponse,
        models::ChunkProgress,
        handlers::models::ModelsResponse,
        handlers::models::ImageGenerationRequest,
        handlers::models::ImageGenerationResponse,
        vidchat_models::ChatModel,
        vidchat_models::CallOptions,
        vidchat_models::Prompt,
        vidchat_models::Message,
        vidchat_models::Part,
        vidchat_models::Role,
        vidchat_models::StreamEvent,
        vidchat_models::FinishReason,
        vidchat_models::Usage,
        vidchat_models::GenerateOutput,
        vidchat_models::GeneratedImage,
    )),
    tags(
        (name = "files", description = "File uploads"),
        (name = "models", description = "Model router")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/files/upload",
            "/api/models",
            "/api/models/{id}/stream",
            "/api/models/{id}/generate",
            "/api/models/{id}/images",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
