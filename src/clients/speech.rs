//! HTTP speech synthesis client.
//!
//! ElevenLabs-shaped contract: one POST per utterance, binary audio in the
//! response body. No polling; latency is bounded by the request timeout.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use super::{status_to_error, transport_error, SpeechClient};
use crate::config::SpeechConfig;
use crate::error::{Error, Result};

const PROVIDER: &str = "speech";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Voice used when neither the scene nor the config names one.
const FALLBACK_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

pub struct HttpSpeech {
    client: Client,
    base_url: String,
    api_key: String,
    default_voice_id: String,
}

impl HttpSpeech {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            default_voice_id: config
                .voice_id
                .clone()
                .unwrap_or_else(|| FALLBACK_VOICE_ID.to_string()),
        })
    }
}

#[derive(Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[async_trait::async_trait]
impl SpeechClient for HttpSpeech {
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Bytes> {
        if text.trim().is_empty() {
            return Err(Error::validation("dialogue text must not be empty"));
        }

        let voice = voice_id.unwrap_or(&self.default_voice_id);
        tracing::info!("Synthesizing {} chars with voice {voice}", text.len());

        let body = SynthesizeBody {
            text,
            model_id: "eleven_multilingual_v2",
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{voice}", self.base_url))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(PROVIDER, status, &body));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        if audio.is_empty() {
            return Err(Error::remote_request(
                PROVIDER,
                "provider returned empty audio",
            ));
        }

        Ok(audio)
    }
}
