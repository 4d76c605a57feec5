//! Removal of inline binary payloads from a conversation.

use crate::types::{Message, Part, Prompt};

/// Copy of `prompt` with every inline `data` payload removed.
///
/// Text, roles, mime types and URLs are kept, so the result still says what
/// was attached without carrying the bytes.
pub fn redact_prompt(prompt: &Prompt) -> Prompt {
    Prompt(
        prompt
            .messages()
            .iter()
            .map(|message| Message {
                role: message.role,
                content: message.content.iter().map(redact_part).collect(),
            })
            .collect(),
    )
}

fn redact_part(part: &Part) -> Part {
    match part {
        Part::Text { text } => Part::Text { text: text.clone() },
        Part::Image { url, mime_type, .. } => Part::Image {
            data: None,
            url: url.clone(),
            mime_type: mime_type.clone(),
        },
        Part::File {
            url,
            mime_type,
            filename,
            ..
        } => Part::File {
            data: None,
            url: url.clone(),
            mime_type: mime_type.clone(),
            filename: filename.clone(),
        },
    }
}
