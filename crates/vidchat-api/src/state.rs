//! Application state shared by every handler.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vidchat_core::{Config, FileSchema};
use vidchat_models::ModelRegistry;
use vidchat_services::{PollPolicy, RemoteJobService};
use vidchat_storage::Storage;

use crate::auth::SessionResolver;
use crate::upload::UploadSessionStore;

/// Upload pipeline collaborators and settings
#[derive(Clone)]
pub struct UploadState {
    pub storage: Arc<dyn Storage>,
    pub jobs: Arc<dyn RemoteJobService>,
    pub sessions: UploadSessionStore,
    pub schema: Arc<FileSchema>,
    pub poll_policy: PollPolicy,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub upload: UploadState,
    pub models: ModelRegistry,
    pub session_resolver: Arc<dyn SessionResolver>,
    /// Stops background tasks (the upload session reaper) on shutdown
    pub shutdown: CancellationToken,
}
