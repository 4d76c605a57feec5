//! Storage setup and initialization

use anyhow::Result;
use std::sync::Arc;
use vidchat_core::Config;
use vidchat_storage::{create_storage, Storage};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing blob storage...");
    let storage = create_storage(config).await?;
    tracing::info!(
        backend = %storage.backend_type(),
        "Blob storage initialized successfully"
    );
    Ok(storage)
}
