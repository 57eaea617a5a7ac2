//! Bounded polling for remote jobs.

use std::future::Future;
use std::time::{Duration, Instant};

use super::JobStatus;
use crate::error::{Error, Result};

/// How often to poll a remote job, and for how long at most.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }
}

/// Poll `poll` until the job reports done or failed, or the wall-clock
/// budget runs out. Returns the download URL on success.
///
/// # Errors
///
/// - [`Error::RemoteRequest`] carrying the remote-reported reason when the
///   job fails.
/// - [`Error::RemoteTimeout`] when `policy.max_wait` elapses without a
///   terminal state. A timeout is always surfaced distinctly from a remote
///   failure.
pub async fn wait_for_completion<F, Fut>(
    provider: &str,
    policy: &PollPolicy,
    mut poll: F,
) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobStatus>>,
{
    let start = Instant::now();

    loop {
        match poll().await? {
            JobStatus::Done { download_url } => return Ok(download_url),
            JobStatus::Failed { reason } => {
                return Err(Error::remote_request(provider, reason));
            }
            JobStatus::Pending => {
                tracing::debug!("{provider} job still pending ({:?} elapsed)", start.elapsed());
            }
        }

        if start.elapsed() >= policy.max_wait {
            return Err(Error::RemoteTimeout {
                provider: provider.to_string(),
                elapsed: start.elapsed(),
            });
        }

        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn done_returns_url() {
        let url = wait_for_completion("videogen", &fast_policy(), || async {
            Ok(JobStatus::Done {
                download_url: "https://cdn.example/clip.mp4".into(),
            })
        })
        .await
        .unwrap();
        assert_eq!(url, "https://cdn.example/clip.mp4");
    }

    #[tokio::test]
    async fn remote_failure_carries_reason() {
        let err = wait_for_completion("videogen", &fast_policy(), || async {
            Ok(JobStatus::Failed {
                reason: "content_policy".into(),
            })
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "remote");
        assert!(err.to_string().contains("content_policy"));
    }

    #[tokio::test]
    async fn pending_forever_times_out() {
        let polls = AtomicUsize::new(0);
        let err = wait_for_completion("lipsync", &fast_policy(), || {
            polls.fetch_add(1, Ordering::SeqCst);
            async { Ok(JobStatus::Pending) }
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "timeout");
        // Polled at least twice before exhausting the budget.
        assert!(polls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn pending_then_done() {
        let polls = AtomicUsize::new(0);
        let url = wait_for_completion("videogen", &fast_policy(), || {
            let n = polls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Ok(JobStatus::Pending)
                } else {
                    Ok(JobStatus::Done {
                        download_url: "u".into(),
                    })
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(url, "u");
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn poll_error_propagates() {
        let err = wait_for_completion("videogen", &fast_policy(), || async {
            Err(Error::remote_auth("videogen", "expired token"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "auth");
    }
}
