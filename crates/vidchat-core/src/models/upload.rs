use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::CHUNK_RECEIVED_STATUS;
use crate::error::AppError;

/// A durable blob produced by a completed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Public URL of the object
    pub url: String,
    /// URL that forces a download
    pub download_url: String,
    /// Key of the object inside the store
    pub pathname: String,
    pub content_type: String,
    pub content_disposition: String,
}

/// Final response of an upload (single-shot or last chunk)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(flatten)]
    pub object: StoredObject,
    /// Remote file reference, present for processed videos only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_uri: Option<String>,
}

/// Response to a non-final chunk
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkProgress {
    /// Always "chunk-received"
    pub status: String,
    /// Percentage of the declared size committed so far
    pub progress: u8,
    /// Id to send back in `x-upload-id` with the next chunk
    pub upload_id: Uuid,
}

impl ChunkProgress {
    pub fn new(upload_id: Uuid, committed: u64, total: u64) -> Self {
        Self {
            status: CHUNK_RECEIVED_STATUS.to_string(),
            progress: progress_percent(committed, total),
            upload_id,
        }
    }
}

/// floor(committed * 100 / total), clamped to 100
pub fn progress_percent(committed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (committed as u128 * 100) / total as u128;
    pct.min(100) as u8
}

/// Parsed `content-range: bytes {start}-{end}/{total}` header (inclusive end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ContentRange {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidInput(format!("Malformed content-range header: {}", raw));

        let spec = raw.trim().strip_prefix("bytes").ok_or_else(invalid)?.trim_start();
        let (range, total) = spec.split_once('/').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;

        let start = start.trim().parse::<u64>().map_err(|_| invalid())?;
        let end = end.trim().parse::<u64>().map_err(|_| invalid())?;
        let total = total.trim().parse::<u64>().map_err(|_| invalid())?;

        Ok(Self { start, end, total })
    }

    /// Number of bytes the range covers
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_first(&self) -> bool {
        self.start == 0
    }

    pub fn is_final(&self) -> bool {
        self.end + 1 == self.total
    }

    /// Structural checks that do not depend on session state
    pub fn check_bounds(&self) -> Result<(), AppError> {
        if self.end < self.start {
            return Err(AppError::SequenceError(format!(
                "Range end {} is before start {}",
                self.end, self.start
            )));
        }
        if self.end >= self.total {
            return Err(AppError::SequenceError(format!(
                "Range end {} is outside declared size {}",
                self.end, self.total
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range() {
        let range = ContentRange::parse("bytes 0-4194303/10485760").unwrap();
        assert_eq!(range.start, 0);
        assert_eq!(range.end, 4194303);
        assert_eq!(range.total, 10485760);
        assert_eq!(range.len(), 4194304);
        assert!(range.is_first());
        assert!(!range.is_final());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ContentRange::parse("items 0-1/2").is_err());
        assert!(ContentRange::parse("bytes 0-1").is_err());
        assert!(ContentRange::parse("bytes a-1/2").is_err());
        assert!(ContentRange::parse("bytes */2").is_err());
    }

    #[test]
    fn test_bounds() {
        assert!(ContentRange::parse("bytes 5-4/10").unwrap().check_bounds().is_err());
        assert!(ContentRange::parse("bytes 0-10/10").unwrap().check_bounds().is_err());
        let last = ContentRange::parse("bytes 8-9/10").unwrap();
        assert!(last.check_bounds().is_ok());
        assert!(last.is_final());
    }

    #[test]
    fn test_progress_floors() {
        let mb = 1024 * 1024;
        assert_eq!(progress_percent(4 * mb, 10 * mb), 40);
        assert_eq!(progress_percent(8 * mb, 10 * mb), 80);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[test]
    fn test_upload_response_omits_missing_gemini_uri() {
        let response = UploadResponse {
            object: StoredObject {
                url: "https://blobs/a.jpg".to_string(),
                download_url: "https://blobs/a.jpg?download=1".to_string(),
                pathname: "a.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                content_disposition: "attachment; filename=\"a.jpg\"".to_string(),
            },
            gemini_uri: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["downloadUrl"], "https://blobs/a.jpg?download=1");
        assert!(json.get("geminiUri").is_none());
    }
}
