//! Chunked upload sessions.
//!
//! A session is created by the first chunk (`start == 0`) and identified by a
//! server-issued upload id that the client echoes in `x-upload-id`. Chunks must
//! arrive contiguously and in order; each one is appended to a temp file at the
//! committed offset. The chunk that reaches the declared size removes the session
//! from the registry and hands the backing file over for finalization.

use bytes::Bytes;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vidchat_core::models::{ChunkProgress, ContentRange};
use vidchat_core::{AppError, FileCandidate, FileSchema};

/// Headers and body of one chunk request
#[derive(Debug)]
pub struct Chunk<'a> {
    pub upload_id: Option<Uuid>,
    pub range: ContentRange,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub body: Bytes,
}

/// In-progress reassembly of one file
#[derive(Debug)]
pub struct UploadSession {
    id: Uuid,
    owner: String,
    file_name: String,
    content_type: String,
    total: u64,
    committed: u64,
    last_activity: Instant,
    // `None` once finalized or evicted
    backing: Option<(File, TempPath)>,
}

impl UploadSession {
    fn is_closed(&self) -> bool {
        self.backing.is_none()
    }

    /// Drop the backing file; the temp file is removed with it
    fn close(&mut self) -> Option<TempPath> {
        self.backing.take().map(|(_, path)| path)
    }

    fn check(&self, chunk: &Chunk<'_>) -> Result<(), AppError> {
        if chunk.range.total != self.total {
            return Err(AppError::SequenceError(format!(
                "Declared size {} does not match the session's size {}",
                chunk.range.total, self.total
            )));
        }
        if !chunk.content_type.eq_ignore_ascii_case(&self.content_type) {
            return Err(AppError::SequenceError(format!(
                "Content type {} does not match the session's type {}",
                chunk.content_type, self.content_type
            )));
        }
        if chunk.range.start != self.committed {
            return Err(AppError::SequenceError(format!(
                "Expected chunk at offset {}, got {}",
                self.committed, chunk.range.start
            )));
        }
        Ok(())
    }

    async fn append(&mut self, data: &[u8]) -> Result<(), AppError> {
        let committed = self.committed;
        let (file, _) = self
            .backing
            .as_mut()
            .ok_or_else(|| AppError::SessionNotFound(self.id.to_string()))?;

        // Rewind over whatever a failed earlier write may have left behind
        file.seek(SeekFrom::Start(committed)).await?;
        file.write_all(data).await?;
        file.flush().await?;

        self.committed += data.len() as u64;
        self.last_activity = Instant::now();
        Ok(())
    }
}

/// A fully received upload, ready to be stored
#[derive(Debug)]
pub struct CompletedUpload {
    pub upload_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    path: TempPath,
}

impl CompletedUpload {
    /// Location of the reassembled file (deleted when this value is dropped)
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Bytes, AppError> {
        Ok(Bytes::from(tokio::fs::read(&self.path).await?))
    }
}

/// Result of accepting one chunk
#[derive(Debug)]
pub enum ChunkOutcome {
    Progress(ChunkProgress),
    Complete(CompletedUpload),
}

/// Registry of open upload sessions
#[derive(Clone)]
pub struct UploadSessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<UploadSession>>>>>,
    temp_dir: PathBuf,
    ttl: Duration,
}

impl UploadSessionStore {
    pub fn new(temp_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            temp_dir: temp_dir.into(),
            ttl,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn create(
        &self,
        owner: &str,
        file_name: &str,
        content_type: &str,
        total: u64,
    ) -> Result<Arc<Mutex<UploadSession>>, AppError> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let named = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".part")
            .tempfile_in(&self.temp_dir)?;
        let (file, path) = named.into_parts();

        let session = UploadSession {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            total,
            committed: 0,
            last_activity: Instant::now(),
            backing: Some((File::from_std(file), path)),
        };
        let id = session.id;
        let session = Arc::new(Mutex::new(session));

        self.sessions.write().await.insert(id, session.clone());

        tracing::info!(
            upload_id = %id,
            file_name = %file_name,
            total_bytes = total,
            "Upload session created"
        );

        Ok(session)
    }

    /// Look up a session owned by `owner`; other users' sessions are reported as missing
    async fn get(&self, id: Uuid, owner: &str) -> Result<Arc<Mutex<UploadSession>>, AppError> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;

        if session.lock().await.owner != owner {
            tracing::warn!(upload_id = %id, "Chunk for another user's upload session");
            return Err(AppError::SessionNotFound(id.to_string()));
        }
        Ok(session)
    }

    async fn remove(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }

    /// Validate and apply one chunk.
    ///
    /// A rejected chunk leaves the session as it was so the client can resend.
    pub async fn accept(
        &self,
        owner: &str,
        schema: &FileSchema,
        chunk: Chunk<'_>,
    ) -> Result<ChunkOutcome, AppError> {
        chunk.range.check_bounds()?;
        if chunk.body.len() as u64 != chunk.range.len() {
            return Err(AppError::SequenceError(format!(
                "Chunk body has {} bytes but the range covers {}",
                chunk.body.len(),
                chunk.range.len()
            )));
        }

        let (session, created) = match chunk.upload_id {
            Some(id) => (self.get(id, owner).await?, false),
            None if chunk.range.is_first() => {
                schema.validate(&FileCandidate {
                    size: chunk.range.total,
                    content_type: chunk.content_type,
                })?;
                let session = self
                    .create(owner, chunk.file_name, chunk.content_type, chunk.range.total)
                    .await?;
                (session, true)
            }
            None => {
                return Err(AppError::SequenceError(format!(
                    "Chunk at offset {} needs the x-upload-id of its session",
                    chunk.range.start
                )))
            }
        };

        let mut guard = session.lock().await;
        let id = guard.id;

        let result = self.apply(&mut guard, &chunk).await;
        if result.is_err() && created {
            guard.close();
            self.remove(id).await;
        }
        result
    }

    async fn apply(
        &self,
        session: &mut UploadSession,
        chunk: &Chunk<'_>,
    ) -> Result<ChunkOutcome, AppError> {
        // Finalized or evicted while we waited for the lock
        if session.is_closed() {
            return Err(AppError::SessionNotFound(session.id.to_string()));
        }

        session.check(chunk)?;
        session.append(&chunk.body).await?;

        tracing::debug!(
            upload_id = %session.id,
            committed = session.committed,
            total = session.total,
            "Chunk appended"
        );

        if !chunk.range.is_final() {
            return Ok(ChunkOutcome::Progress(ChunkProgress::new(
                session.id,
                session.committed,
                session.total,
            )));
        }

        self.remove(session.id).await;
        let path = session
            .close()
            .ok_or_else(|| AppError::SessionNotFound(session.id.to_string()))?;

        tracing::info!(
            upload_id = %session.id,
            total_bytes = session.total,
            "Upload reassembled"
        );

        Ok(ChunkOutcome::Complete(CompletedUpload {
            upload_id: session.id,
            file_name: session.file_name.clone(),
            content_type: session.content_type.clone(),
            size: session.total,
            path,
        }))
    }

    /// Drop sessions idle for longer than the TTL. Returns how many were evicted.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut evicted = Vec::new();

        for (id, session) in sessions.iter() {
            // A locked session is in use, so not idle
            let Ok(mut guard) = session.try_lock() else {
                continue;
            };
            if guard.last_activity.elapsed() >= self.ttl {
                guard.close();
                evicted.push(*id);
            }
        }

        for id in &evicted {
            sessions.remove(id);
            tracing::info!(upload_id = %id, "Idle upload session evicted");
        }

        evicted.len()
    }

    /// Run [`Self::evict_idle`] every `interval` until `shutdown` fires
    pub fn spawn_reaper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = store.evict_idle().await;
                        if evicted > 0 {
                            tracing::debug!(evicted, "Upload session reaper pass");
                        }
                    }
                }
            }
        })
    }
}
