//! Remote asynchronous processing jobs.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use vidchat_core::models::{JobState, RemoteJob};

use crate::error::ServiceResult;
use crate::gemini::GeminiClient;
use crate::poll::{poll_until, PollOutcome, PollPolicy, Probe};

/// A service that accepts a file and processes it in the background
#[async_trait]
pub trait RemoteJobService: Send + Sync {
    /// Hand the bytes over and return the job as first reported
    async fn submit(
        &self,
        data: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> ServiceResult<RemoteJob>;

    /// Current state of a job
    async fn status(&self, job_id: &str) -> ServiceResult<RemoteJob>;

    /// Drop a job and its remote resources
    async fn cancel(&self, job_id: &str) -> ServiceResult<()>;
}

#[async_trait]
impl RemoteJobService for GeminiClient {
    async fn submit(
        &self,
        data: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> ServiceResult<RemoteJob> {
        self.upload_file(data, mime_type, display_name).await
    }

    async fn status(&self, job_id: &str) -> ServiceResult<RemoteJob> {
        self.get_file(job_id).await
    }

    async fn cancel(&self, job_id: &str) -> ServiceResult<()> {
        self.delete_file(job_id).await
    }
}

/// Poll a submitted job until it is ACTIVE or FAILED, within `policy`.
pub async fn wait_for_job(
    service: &dyn RemoteJobService,
    job_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> ServiceResult<PollOutcome<RemoteJob>> {
    poll_until(policy, cancel, |attempt| async move {
        let job = service.status(job_id).await?;

        tracing::debug!(
            job_id = %job_id,
            attempt,
            state = job.state.as_str(),
            "Polled remote job"
        );

        Ok(match job.state {
            JobState::Active => Probe::Ready(job),
            JobState::Failed => Probe::Failed(format!("{} reported FAILED", job.id)),
            JobState::Processing | JobState::StateUnspecified => Probe::StillPending,
        })
    })
    .await
}
