//! Upload pipeline: chunk reassembly and finalization.

pub mod finalize;
pub mod session;

pub use finalize::finalize_upload;
pub use session::{Chunk, ChunkOutcome, CompletedUpload, UploadSessionStore};
