//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{stem}-{suffix}.{ext}`.

use rand::distr::Alphanumeric;
use rand::Rng;

const KEY_PREFIX: &str = "uploads";
const SUFFIX_LEN: usize = 21;
const MAX_STEM_LEN: usize = 100;

/// Reduce a client file name to a safe single path segment.
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`, directory components are
/// dropped and leading dots are stripped so the result never escapes the prefix.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Generate a storage key for an uploaded file name.
pub fn generate_pathname(filename: &str) -> String {
    let safe = sanitize_filename(filename);
    let (stem, ext) = match safe.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (safe.as_str(), None),
    };
    let stem: String = stem.chars().take(MAX_STEM_LEN).collect();

    match ext {
        Some(ext) => format!("{}/{}-{}.{}", KEY_PREFIX, stem, random_suffix(), ext),
        None => format!("{}/{}-{}", KEY_PREFIX, stem, random_suffix()),
    }
}

/// `attachment` disposition carrying the original file name (RFC 6266 encoded).
pub fn content_disposition(filename: &str) -> String {
    let ascii = sanitize_filename(filename);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

/// URL variant that asks the serving side to force a download
pub fn download_url(url: &str) -> String {
    if url.contains('?') {
        format!("{}&download=1", url)
    } else {
        format!("{}?download=1", url)
    }
}
