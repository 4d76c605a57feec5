//! `POST /api/files/upload`
//!
//! One route, two shapes: a request carrying `content-range` is a chunk of a
//! chunked upload, anything else is a single-shot multipart upload.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vidchat_core::constants::{HEADER_FILE_NAME, HEADER_UPLOAD_ID, UPLOAD_FORM_FIELD};
use vidchat_core::models::ContentRange;
use vidchat_core::{AppError, FileCandidate};

use crate::auth::UserSession;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::upload::{finalize_upload, Chunk, ChunkOutcome};

const DEFAULT_FILE_NAME: &str = "upload";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Strip parameters from a MIME type ("image/jpeg; charset=binary" -> "image/jpeg")
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map_err(|_| AppError::InvalidInput(format!("Header {} is not valid text", name)))
        })
        .transpose()
}

/// Upload a file, either whole or one chunk at a time
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    params(
        ("content-range" = Option<String>, Header, description = "bytes {start}-{end}/{total} for chunked uploads"),
        ("x-file-name" = Option<String>, Header, description = "Original file name of a chunked upload"),
        ("x-upload-id" = Option<Uuid>, Header, description = "Upload id returned by the first chunk")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload stored, or chunk received", body = vidchat_core::models::UploadResponse),
        (status = 400, description = "Validation or sequencing error", body = crate::error::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown upload session", body = crate::error::ErrorResponse),
        (status = 500, description = "Storage or processing failure", body = crate::error::ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    session: UserSession,
    request: Request,
) -> Result<Response, HttpAppError> {
    // Fires when this future is dropped, i.e. when the client disconnects
    let cancel = CancellationToken::new();
    let _disconnect = cancel.clone().drop_guard();

    if request.headers().contains_key(header::CONTENT_RANGE) {
        upload_chunk(&state, &session, request, &cancel).await
    } else {
        upload_single(&state, request, &cancel).await
    }
}

async fn upload_single(
    state: &Arc<AppState>,
    request: Request,
    cancel: &CancellationToken,
) -> Result<Response, HttpAppError> {
    let multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e.body_text())))?;

    let file = extract_multipart_file(multipart, state.config.max_file_size_bytes()).await?;

    state.upload.schema.validate(&FileCandidate {
        size: file.size,
        content_type: &file.content_type,
    })?;

    let response =
        finalize_upload(&state.upload, &file.file_name, &file.content_type, file.data, cancel)
            .await?;
    Ok(Json(response).into_response())
}

/// The `file` field of a multipart body
struct FilePart {
    data: Bytes,
    /// Bytes seen; past the cap reading stops, so this is only a lower bound there
    size: u64,
    file_name: String,
    content_type: String,
}

/// Read the single `file` field of a multipart body, giving up on the data once
/// it grows past `max_bytes` so the size can still be reported with the other
/// validation failures.
async fn extract_multipart_file(
    mut multipart: Multipart,
    max_bytes: u64,
) -> Result<FilePart, AppError> {
    let mut file: Option<FilePart> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FORM_FIELD) {
            continue;
        }
        if file.is_some() {
            return Err(AppError::InvalidInput(
                "Send exactly one field named 'file'".to_string(),
            ));
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let content_type = normalize_mime_type(field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE));

        let mut data = BytesMut::new();
        let mut size = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?
        {
            size += chunk.len() as u64;
            if size > max_bytes {
                tracing::debug!(file_name = %file_name, size, max_bytes, "File over the size cap, stopped reading");
                return Ok(FilePart {
                    data: Bytes::new(),
                    size,
                    file_name,
                    content_type,
                });
            }
            data.extend_from_slice(&chunk);
        }

        file = Some(FilePart {
            data: data.freeze(),
            size,
            file_name,
            content_type,
        });
    }

    file.ok_or(AppError::MissingFile)
}

async fn upload_chunk(
    state: &Arc<AppState>,
    session: &UserSession,
    request: Request,
    cancel: &CancellationToken,
) -> Result<Response, HttpAppError> {
    let (parts, body) = request.into_parts();
    let headers = &parts.headers;

    let range = header_str(headers, header::CONTENT_RANGE.as_str())?
        .map(ContentRange::parse)
        .transpose()?
        .ok_or_else(|| AppError::InvalidInput("Missing content-range header".to_string()))?;
    let file_name = header_str(headers, HEADER_FILE_NAME)?
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME);
    let content_type = normalize_mime_type(
        header_str(headers, header::CONTENT_TYPE.as_str())?.unwrap_or(DEFAULT_CONTENT_TYPE),
    );
    let upload_id = header_str(headers, HEADER_UPLOAD_ID)?
        .map(|id| Uuid::parse_str(id.trim()))
        .transpose()
        .map_err(AppError::from)?;

    let limit = usize::try_from(state.config.max_file_size_bytes()).unwrap_or(usize::MAX);
    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read chunk body: {}", e)))?;

    let outcome = state
        .upload
        .sessions
        .accept(
            &session.user_id,
            &state.upload.schema,
            Chunk {
                upload_id,
                range,
                file_name,
                content_type: &content_type,
                body,
            },
        )
        .await?;

    match outcome {
        ChunkOutcome::Progress(progress) => Ok(Json(progress).into_response()),
        ChunkOutcome::Complete(done) => {
            let data = done.read().await?;
            let result =
                finalize_upload(&state.upload, &done.file_name, &done.content_type, data, cancel)
                    .await;
            tracing::debug!(upload_id = %done.upload_id, ok = result.is_ok(), "Chunked upload finalized");
            // Removes the reassembled temp file whatever the outcome
            drop(done);
            Ok(Json(result?).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("Video/MP4"), "video/mp4");
        assert_eq!(normalize_mime_type("image/jpeg; charset=binary"), "image/jpeg");
    }

    #[test]
    fn test_header_str() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_FILE_NAME, "clip.mp4".parse().unwrap());
        assert_eq!(header_str(&headers, HEADER_FILE_NAME).unwrap(), Some("clip.mp4"));
        assert_eq!(header_str(&headers, HEADER_UPLOAD_ID).unwrap(), None);
    }
}
