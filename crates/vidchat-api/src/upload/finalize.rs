//! Storing a completed upload and, for video, waiting on remote processing.

use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vidchat_core::constants::VIDEO_MP4;
use vidchat_core::models::{RemoteJob, UploadResponse};
use vidchat_core::AppError;
use vidchat_services::{wait_for_job, PollOutcome, RemoteJobService, ServiceResult};
use vidchat_storage::put_object;

use crate::state::UploadState;

fn is_video(content_type: &str) -> bool {
    content_type.eq_ignore_ascii_case(VIDEO_MP4)
}

/// Store the object, then submit videos to the remote job and poll it to a
/// terminal state.
///
/// `cancel` fires when the client goes away. After submission a watcher deletes
/// the remote file if that happens before polling is over.
#[tracing::instrument(skip(upload, data, cancel), fields(size = data.len()))]
pub async fn finalize_upload(
    upload: &UploadState,
    file_name: &str,
    content_type: &str,
    data: Bytes,
    cancel: &CancellationToken,
) -> Result<UploadResponse, AppError> {
    let object = put_object(upload.storage.as_ref(), file_name, content_type, data.clone()).await?;

    tracing::info!(
        pathname = %object.pathname,
        content_type = %content_type,
        "Upload stored"
    );

    if !is_video(content_type) {
        return Ok(UploadResponse {
            object,
            gemini_uri: None,
        });
    }

    let job = upload.jobs.submit(data, content_type, file_name).await?;
    tracing::info!(job_id = %job.id, state = job.state.as_str(), "Remote job submitted");

    let finished = CancellationToken::new();
    spawn_cancel_watcher(upload.jobs.clone(), job.id.clone(), cancel.clone(), finished.clone());

    let outcome = wait_for_job(upload.jobs.as_ref(), &job.id, &upload.poll_policy, cancel).await;
    finished.cancel();

    let job = settle(upload.jobs.as_ref(), &job.id, outcome).await?;

    Ok(UploadResponse {
        object,
        gemini_uri: Some(job.uri),
    })
}

/// Map a poll outcome to the processed job or the matching error.
///
/// Jobs that did not become ready, including those whose status could not be
/// read, are deleted on a best-effort basis.
async fn settle(
    jobs: &dyn RemoteJobService,
    job_id: &str,
    outcome: ServiceResult<PollOutcome<RemoteJob>>,
) -> Result<RemoteJob, AppError> {
    let err = match outcome {
        Err(e) => AppError::from(e),
        Ok(PollOutcome::Ready(job)) => {
            tracing::info!(job_id = %job_id, uri = %job.uri, "Remote job active");
            return Ok(job);
        }
        Ok(PollOutcome::Failed(reason)) => AppError::RemoteJobFailed {
            job_id: job_id.to_string(),
            reason,
        },
        Ok(PollOutcome::TimedOut { attempts }) => AppError::RemoteJobTimedOut {
            job_id: job_id.to_string(),
            attempts,
        },
        Ok(PollOutcome::Cancelled) => AppError::RemoteJobCancelled {
            job_id: job_id.to_string(),
        },
    };

    if let Err(e) = jobs.cancel(job_id).await {
        tracing::warn!(job_id = %job_id, error = %e, "Failed to delete remote job");
    }
    Err(err)
}

/// Delete the remote file if `cancel` fires before `finished`
fn spawn_cancel_watcher(
    jobs: Arc<dyn RemoteJobService>,
    job_id: String,
    cancel: CancellationToken,
    finished: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = finished.cancelled() => {}
            _ = cancel.cancelled() => {
                if finished.is_cancelled() {
                    return;
                }
                tracing::info!(job_id = %job_id, "Client went away, deleting remote job");
                if let Err(e) = jobs.cancel(&job_id).await {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed to delete remote job");
                }
            }
        }
    });
}
