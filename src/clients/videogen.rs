//! HTTP video generation client.
//!
//! Speaks a REST job API: submit a generation (or extension) request, poll
//! the job, download the finished clip.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    download_to_file, status_to_error, transport_error, GenerationRequest, JobId, JobStatus,
    VideoGenClient,
};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};

const PROVIDER: &str = "videogen";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpVideoGen {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpVideoGen {
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

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_video: Option<&'a str>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Deserialize)]
struct PollResponse {
    status: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait::async_trait]
impl VideoGenClient for HttpVideoGen {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobId> {
        let body = match request {
            GenerationRequest::Prompt(prompt) => SubmitBody {
                prompt,
                source_video: None,
            },
            GenerationRequest::Extend { source, prompt } => SubmitBody {
                prompt,
                source_video: Some(source),
            },
        };

        tracing::info!(
            "Submitting {} request to {PROVIDER}",
            if body.source_video.is_some() {
                "extension"
            } else {
                "generation"
            }
        );

        let response = self
            .client
            .post(self.url("/v1/jobs"))
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

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| Error::remote_request(PROVIDER, format!("malformed submit response: {e}")))?;

        Ok(JobId(submit.job_id))
    }

    async fn poll(&self, job: &JobId) -> Result<JobStatus> {
        let response = self
            .client
            .get(self.url(&format!("/v1/jobs/{job}")))
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
            "pending" | "running" => Ok(JobStatus::Pending),
            "done" => {
                let download_url = poll.download_url.ok_or_else(|| {
                    Error::remote_request(PROVIDER, "job done but no download_url in response")
                })?;
                Ok(JobStatus::Done { download_url })
            }
            "failed" => Ok(JobStatus::Failed {
                reason: poll.reason.unwrap_or_else(|| "unknown".into()),
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
