//! Vidchat API Library
//!
//! HTTP surface of the vidchat backend: session middleware, the upload endpoint
//! with chunk reassembly, the model routes and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;
pub mod upload;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
