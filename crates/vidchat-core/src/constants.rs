//! Shared constants

/// Multipart field carrying a single-shot upload
pub const UPLOAD_FORM_FIELD: &str = "file";

/// Header carrying the original file name of a chunked upload
pub const HEADER_FILE_NAME: &str = "x-file-name";

/// Header carrying the server-issued id of a chunked upload session
pub const HEADER_UPLOAD_ID: &str = "x-upload-id";

/// Mime type that triggers submission to the remote processing job
pub const VIDEO_MP4: &str = "video/mp4";

/// Status reported for a non-final chunk
pub const CHUNK_RECEIVED_STATUS: &str = "chunk-received";

/// Cookie consulted when no bearer token is present
pub const SESSION_COOKIE: &str = "session-token";
