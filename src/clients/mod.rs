//! Remote service clients.
//!
//! Three independent capability seams wrap the external HTTP providers:
//! video generation, speech synthesis, and lip synchronization. The
//! orchestrator only ever sees the trait contracts and the closed
//! [`JobStatus`] variants; raw provider payloads are decoded at the client
//! boundary.

mod lipsync;
mod poll;
mod speech;
mod videogen;

pub use lipsync::HttpLipSync;
pub use poll::{wait_for_completion, PollPolicy};
pub use speech::HttpSpeech;
pub use videogen::HttpVideoGen;

use std::path::Path;

use bytes::Bytes;
use reqwest::StatusCode;

use crate::error::{Error, Result};

/// Opaque handle to a submitted remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of a remote job as reported by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done { download_url: String },
    Failed { reason: String },
}

/// What to ask the video generation provider for.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    /// Generate a fresh clip from a prompt.
    Prompt(String),
    /// Extend an existing video, guided by a prompt.
    Extend { source: String, prompt: String },
}

/// Video generation provider: submit, poll, download.
#[async_trait::async_trait]
pub trait VideoGenClient: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobId>;
    async fn poll(&self, job: &JobId) -> Result<JobStatus>;
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Speech synthesis provider. Synchronous contract: the provider returns
/// audio within one bounded-latency request, no polling.
#[async_trait::async_trait]
pub trait SpeechClient: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Bytes>;
}

/// Lip-sync provider: submit a video/audio pair, then poll and download
/// like video generation.
#[async_trait::async_trait]
pub trait LipSyncClient: Send + Sync {
    async fn submit(&self, video: &Path, audio: &Path) -> Result<JobId>;
    async fn poll(&self, job: &JobId) -> Result<JobStatus>;
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Map an HTTP error status to the matching error kind.
///
/// Auth rejections, quota rejections and plain bad requests are distinct so
/// the caller can word them differently; all are fatal to the current scene.
pub(crate) fn status_to_error(provider: &str, status: StatusCode, body: &str) -> Error {
    let body = if body.trim().is_empty() {
        "(empty response body)"
    } else {
        body.trim()
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::remote_auth(provider, body),
        StatusCode::TOO_MANY_REQUESTS => Error::remote_quota(provider, body),
        _ => Error::remote_request(provider, format!("HTTP {status}: {body}")),
    }
}

/// Map a transport-level reqwest failure.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> Error {
    Error::remote_request(provider, err.to_string())
}

/// Fetch a remote artifact into a local file, creating parent directories.
pub(crate) async fn download_to_file(
    client: &reqwest::Client,
    provider: &str,
    url: &str,
    dest: &Path,
) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_to_error(provider, status, &body));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(provider, e))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, &bytes).await?;

    tracing::info!("Downloaded {} bytes to {}", bytes.len(), dest.display());
    Ok(())
}
