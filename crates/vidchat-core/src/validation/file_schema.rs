//! Declarative upload validation.
//!
//! A [`FileSchema`] is an ordered list of rules. Every rule is evaluated and all
//! violated messages are reported together.

use crate::error::AppError;

/// What the schema sees of an upload: declared size and content type
#[derive(Debug, Clone, Copy)]
pub struct FileCandidate<'a> {
    pub size: u64,
    pub content_type: &'a str,
}

type Predicate = Box<dyn Fn(&FileCandidate<'_>) -> bool + Send + Sync>;

/// A single rule: a predicate that must hold plus the message reported when it doesn't
pub struct FileRule {
    message: String,
    check: Predicate,
}

impl FileRule {
    pub fn new<F>(message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&FileCandidate<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            check: Box::new(check),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for FileRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRule")
            .field("message", &self.message)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct FileSchema {
    rules: Vec<FileRule>,
}

impl FileSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: FileRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Schema for uploads: non-empty, at most `max_bytes`, content type in `allowed`.
    pub fn for_uploads(max_bytes: u64, allowed: &[String]) -> Self {
        let allowed: Vec<String> = allowed.iter().map(|ct| ct.to_lowercase()).collect();
        let type_message = format!("File type should be {}", describe_types(&allowed));

        Self::new()
            .rule(FileRule::new("File should not be empty", |f| f.size > 0))
            .rule(FileRule::new(
                format!("File size should be less than {}", describe_size(max_bytes)),
                move |f| f.size <= max_bytes,
            ))
            .rule(FileRule::new(type_message, move |f| {
                let normalized = f.content_type.trim().to_lowercase();
                allowed.iter().any(|ct| *ct == normalized)
            }))
    }

    /// Messages of every violated rule, in declaration order
    pub fn violations(&self, candidate: &FileCandidate<'_>) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| !(rule.check)(candidate))
            .map(|rule| rule.message.clone())
            .collect()
    }

    pub fn validate(&self, candidate: &FileCandidate<'_>) -> Result<(), AppError> {
        let reasons = self.violations(candidate);
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed { reasons })
        }
    }
}

fn describe_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// "image/jpeg", "image/png", "video/mp4" -> "JPEG, PNG, or MP4"
fn describe_types(types: &[String]) -> String {
    let labels: Vec<String> = types
        .iter()
        .map(|ct| {
            ct.rsplit('/')
                .next()
                .unwrap_or(ct.as_str())
                .to_uppercase()
        })
        .collect();

    match labels.len() {
        0 => "none".to_string(),
        1 => labels[0].clone(),
        2 => format!("{} or {}", labels[0], labels[1]),
        n => format!("{}, or {}", labels[..n - 1].join(", "), labels[n - 1]),
    }
}
