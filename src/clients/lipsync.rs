//! HTTP lip-sync client.
//!
//! Submission uploads the local video and audio artifacts, then creates the
//! sync job referencing the uploaded URLs. Polling and download follow the
//! same shape as video generation.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    download_to_file, status_to_error, transport_error, JobId, JobStatus, LipSyncClient,
};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};

const PROVIDER: &str = "lipsync";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpLipSync {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpLipSync {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Upload a local file, returning the provider-hosted URL.
    async fn upload(&self, endpoint: &str, field: &'static str, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.to_string());
        let data = tokio::fs::read(path).await?;

        tracing::info!("Uploading {} ({} bytes)", path.display(), data.len());

        let form = multipart::Form::new().part(
            field,
            multipart::Part::bytes(data).file_name(file_name),
        );

        let response = self
            .client
            .post(format!("{}{endpoint}", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(PROVIDER, status, &body));
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            Error::remote_request(PROVIDER, format!("malformed upload response: {e}"))
        })?;
        Ok(uploaded.url)
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Serialize)]
struct CreateBody<'a> {
    source_url: &'a str,
    script: Script<'a>,
}

#[derive(Serialize)]
struct Script<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    audio_url: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
struct PollResponse {
    status: String,
    #[serde(default)]
    result_url: Option<String>,
    #[serde(default)]
    error: Option<PollError>,
}

#[derive(Deserialize)]
struct PollError {
    #[serde(default)]
    description: Option<String>,
}

#[async_trait::async_trait]
impl LipSyncClient for HttpLipSync {
    async fn submit(&self, video: &Path, audio: &Path) -> Result<JobId> {
        let video_url = self.upload("/videos", "video", video).await?;
        let audio_url = self.upload("/audios", "audio", audio).await?;

        let body = CreateBody {
            source_url: &video_url,
            script: Script {
                kind: "audio",
                audio_url: &audio_url,
            },
        };

        let response = self
            .client
            .post(format!("{}/talks", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(PROVIDER, status, &body));
        }

        let created: CreateResponse = response.json().await.map_err(|e| {
            Error::remote_request(PROVIDER, format!("malformed create response: {e}"))
        })?;

        tracing::info!("Created lip-sync job {}", created.id);
        Ok(JobId(created.id))
    }

    async fn poll(&self, job: &JobId) -> Result<JobStatus> {
        let response = self
            .client
            .get(format!("{}/talks/{job}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(PROVIDER, status, &body));
        }

        let poll: PollResponse = response
            .json()
            .await
            .map_err(|e| Error::remote_request(PROVIDER, format!("malformed poll response: {e}")))?;

        match poll.status.as_str() {
            "created" | "started" => Ok(JobStatus::Pending),
            "done" => {
                let download_url = poll.result_url.ok_or_else(|| {
                    Error::remote_request(PROVIDER, "job done but no result_url in response")
                })?;
                Ok(JobStatus::Done { download_url })
            }
            "error" | "rejected" => Ok(JobStatus::Failed {
                reason: poll
                    .error
                    .and_then(|e| e.description)
                    .unwrap_or_else(|| "unknown".into()),
            }),
            other => Err(Error::remote_request(
                PROVIDER,
                format!("unrecognized job status '{other}'"),
            )),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        download_to_file(&self.client, PROVIDER, url, dest).await
    }
}
