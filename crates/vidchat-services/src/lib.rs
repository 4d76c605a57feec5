//! Vidchat Services Library
//!
//! Outbound integrations used by the upload pipeline and the model router:
//! the Gemini REST client, the [`RemoteJobService`] seam over asynchronous file
//! processing, and the bounded polling helper that waits on it.

pub mod error;
pub mod gemini;
pub mod jobs;
pub mod poll;

pub use error::{ServiceError, ServiceResult};
pub use gemini::{GeminiClient, GenerateContentChunk, GenerateContentStream};
pub use jobs::{wait_for_job, RemoteJobService};
pub use poll::{poll_until, PollOutcome, PollPolicy, Probe};
