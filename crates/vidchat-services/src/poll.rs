//! Bounded polling of asynchronous remote work.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How often and how many times to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 10,
        }
    }
}

/// Result of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    StillPending,
    Ready(T),
    Failed(String),
}

/// Final result of a poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    Failed(String),
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Probe until a terminal answer, the attempt budget is spent, or `cancel` fires.
///
/// The first probe runs immediately. At most `policy.max_attempts` probes are
/// made and there is no wait after the last one. The wait between probes races
/// the cancellation token. Probe errors are returned as-is without retrying.
/// A zero budget still makes one probe; `Config::validate` rejects it at startup.
pub async fn poll_until<T, E, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Probe<T>, E>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        match probe(attempt).await? {
            Probe::Ready(value) => return Ok(PollOutcome::Ready(value)),
            Probe::Failed(reason) => return Ok(PollOutcome::Failed(reason)),
            Probe::StillPending => {}
        }

        if attempt == max_attempts {
            break;
        }

        tracing::debug!(attempt, max_attempts, "Remote work still pending");

        tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }

    Ok(PollOutcome::TimedOut {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_times_out_after_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome: Result<PollOutcome<()>, ()> =
            poll_until(&fast(10), &CancellationToken::new(), move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Probe::StillPending)
                }
            })
            .await;

        assert_eq!(outcome, Ok(PollOutcome::TimedOut { attempts: 10 }));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_ready_on_third_probe() {
        let outcome: Result<_, ()> =
            poll_until(&fast(10), &CancellationToken::new(), |attempt| async move {
                if attempt == 3 {
                    Ok(Probe::Ready(attempt))
                } else {
                    Ok(Probe::StillPending)
                }
            })
            .await;

        assert_eq!(outcome, Ok(PollOutcome::Ready(3)));
    }

    #[tokio::test]
    async fn test_failed_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome: Result<PollOutcome<()>, ()> =
            poll_until(&fast(10), &CancellationToken::new(), move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Probe::Failed("FAILED".to_string()))
                }
            })
            .await;

        assert_eq!(outcome, Ok(PollOutcome::Failed("FAILED".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_error_propagates() {
        let outcome: Result<PollOutcome<()>, &str> =
            poll_until(&fast(5), &CancellationToken::new(), |_| async {
                Err("connection reset")
            })
            .await;

        assert_eq!(outcome, Err("connection reset"));
    }

    #[tokio::test]
    async fn test_cancel_during_wait() {
        let cancel = CancellationToken::new();
        let policy = PollPolicy {
            interval: Duration::from_secs(60),
            max_attempts: 10,
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome: Result<PollOutcome<()>, ()> =
            poll_until(&policy, &cancel, |_| async { Ok(Probe::StillPending) }).await;

        assert_eq!(outcome, Ok(PollOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_probe() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome: Result<PollOutcome<()>, ()> = poll_until(&fast(3), &cancel, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Probe::StillPending)
            }
        })
        .await;

        assert_eq!(outcome, Ok(PollOutcome::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
