//! Splitting `<tag>...</tag>` reasoning out of model text.
//!
//! Reasoning models such as deepseek-r1 inline their chain of thought as
//! `<think>...</think>` in the text. [`ExtractReasoning`] wraps such a model
//! and re-emits that span as `reasoning` events. Tags may be split across
//! stream fragments.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use crate::error::ModelResult;
use crate::model::{EventStream, LanguageModel};
use crate::types::{CallOptions, GenerateOutput, StreamEvent};

/// Incremental tag parser over text fragments
#[derive(Debug)]
pub struct ReasoningExtractor {
    open_tag: String,
    close_tag: String,
    in_reasoning: bool,
    buffer: String,
}

impl ReasoningExtractor {
    pub fn new(tag: &str) -> Self {
        Self {
            open_tag: format!("<{}>", tag),
            close_tag: format!("</{}>", tag),
            in_reasoning: false,
            buffer: String::new(),
        }
    }

    fn emit(&self, text: &str, out: &mut Vec<StreamEvent>) {
        if text.is_empty() {
            return;
        }
        if self.in_reasoning {
            out.push(StreamEvent::reasoning(text));
        } else {
            out.push(StreamEvent::text_delta(text));
        }
    }

    /// Feed one fragment; returns the events that can be emitted so far
    pub fn push(&mut self, fragment: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(fragment);
        let mut out = Vec::new();

        loop {
            let tag = if self.in_reasoning {
                &self.close_tag
            } else {
                &self.open_tag
            };

            if let Some(idx) = self.buffer.find(tag.as_str()) {
                let tag_len = tag.len();
                let before = self.buffer[..idx].to_string();
                self.emit(&before, &mut out);
                self.buffer.drain(..idx + tag_len);
                self.in_reasoning = !self.in_reasoning;
                continue;
            }

            // Hold back a trailing partial tag
            let keep = partial_suffix_len(&self.buffer, tag);
            let split = self.buffer.len() - keep;
            let ready = self.buffer[..split].to_string();
            self.emit(&ready, &mut out);
            self.buffer.drain(..split);
            break;
        }

        out
    }

    /// Flush whatever is still buffered at end of stream
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        let rest = std::mem::take(&mut self.buffer);
        self.emit(&rest, &mut out);
        out
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `tag`
fn partial_suffix_len(text: &str, tag: &str) -> usize {
    let max = tag.len().saturating_sub(1).min(text.len());
    (1..=max)
        .rev()
        .find(|&k| {
            let start = text.len() - k;
            text.is_char_boundary(start) && tag.starts_with(&text[start..])
        })
        .unwrap_or(0)
}

/// Split a complete text into (reasoning, remaining text)
pub fn extract_reasoning(text: &str, tag: &str) -> (Option<String>, String) {
    let mut extractor = ReasoningExtractor::new(tag);
    let mut events = extractor.push(text);
    events.extend(extractor.finish());

    let mut reasoning = String::new();
    let mut rest = String::new();
    for event in events {
        match event {
            StreamEvent::Reasoning { text_delta } => reasoning.push_str(&text_delta),
            StreamEvent::TextDelta { text_delta } => rest.push_str(&text_delta),
            StreamEvent::Finish { .. } => {}
        }
    }

    let reasoning = (!reasoning.is_empty()).then_some(reasoning);
    (reasoning, rest.trim_start().to_string())
}

/// A language model whose `<tag>` spans are reported as reasoning
pub struct ExtractReasoning {
    inner: Arc<dyn LanguageModel>,
    tag: String,
}

impl ExtractReasoning {
    pub fn new(inner: Arc<dyn LanguageModel>, tag: impl Into<String>) -> Self {
        Self {
            inner,
            tag: tag.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for ExtractReasoning {
    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn generate(&self, options: CallOptions) -> ModelResult<GenerateOutput> {
        let output = self.inner.generate(options).await?;
        let (reasoning, text) = extract_reasoning(&output.text, &self.tag);

        Ok(GenerateOutput {
            text,
            reasoning,
            ..output
        })
    }

    async fn stream(&self, options: CallOptions) -> ModelResult<EventStream> {
        let mut upstream = self.inner.stream(options).await?;
        let mut extractor = ReasoningExtractor::new(&self.tag);

        let stream = async_stream::stream! {
            while let Some(event) = upstream.next().await {
                match event {
                    Ok(StreamEvent::TextDelta { text_delta }) => {
                        for event in extractor.push(&text_delta) {
                            yield Ok(event);
                        }
                    }
                    Ok(finish @ StreamEvent::Finish { .. }) => {
                        for event in extractor.finish() {
                            yield Ok(event);
                        }
                        yield Ok(finish);
                    }
                    other => yield other,
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
