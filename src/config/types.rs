use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Root directory holding per-scene subdirectories.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Video generation provider. Required for every pipeline run.
    #[serde(default)]
    pub videogen: Option<ProviderConfig>,

    /// Text-to-speech provider. Required only for scenes with dialogue.
    #[serde(default)]
    pub speech: Option<SpeechConfig>,

    /// Lip-sync provider. Required only for scenes with dialogue that do
    /// not set `skip_lipsync`.
    #[serde(default)]
    pub lipsync: Option<ProviderConfig>,

    #[serde(default)]
    pub transcode: TranscodeConfig,

    #[serde(default)]
    pub poll: PollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            videogen: None,
            speech: None,
            lipsync: None,
            transcode: TranscodeConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

fn default_project_root() -> PathBuf {
    PathBuf::from("./project")
}

/// Credentials and endpoint for one remote provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub base_url: String,

    /// May be injected via environment instead of the config file.
    #[serde(default)]
    pub api_key: String,
}

/// Speech provider config; extends [`ProviderConfig`] with a default voice.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeechConfig {
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Default voice used when a scene does not override it.
    #[serde(default)]
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// Explicit ffmpeg binary path; discovered on PATH when unset.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe binary path; discovered on PATH when unset.
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// ProRes profile index: 0=Proxy, 1=LT, 2=422, 3=422HQ.
    #[serde(default = "default_prores_profile")]
    pub prores_profile: u8,

    /// Maximum wall-clock time for one tool invocation.
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            prores_profile: default_prores_profile(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

impl TranscodeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_prores_profile() -> u8 {
    2
}
fn default_tool_timeout() -> u64 {
    600
}

/// Polling bounds for remote jobs (video generation and lip-sync).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Delay between status checks.
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,

    /// Maximum wall-clock wait before a job is declared timed out.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            max_wait_secs: default_max_wait(),
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}
fn default_max_wait() -> u64 {
    600
}
