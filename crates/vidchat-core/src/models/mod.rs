//! Data models shared across crates
//!
//! Upload wire types and the remote processing job model.

mod job;
mod upload;

pub use job::*;
pub use upload::*;
