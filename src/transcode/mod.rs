//! ffmpeg/ffprobe wrapper.
//!
//! Produces ProRes mezzanine copies of arbitrary input video and extracts
//! basic media metadata. Both tools run as external processes with a
//! configurable timeout; a timeout is reported as [`Error::ToolTimeout`],
//! distinct from a non-zero exit.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use crate::config::TranscodeConfig;
use crate::error::{Error, Result};

/// Probed media metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    pub duration: Option<Duration>,
    pub width: u32,
    pub height: u32,
}

/// Availability of one external tool, for the `check-tools` command.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: Option<PathBuf>,
}

/// Report availability of the tools the transcoder depends on.
pub fn check_tools(config: &TranscodeConfig) -> Vec<ToolStatus> {
    vec![
        ToolStatus {
            name: "ffmpeg",
            path: resolve_tool(&config.ffmpeg_path, "ffmpeg"),
        },
        ToolStatus {
            name: "ffprobe",
            path: resolve_tool(&config.ffprobe_path, "ffprobe"),
        },
    ]
}

fn resolve_tool(configured: &Option<PathBuf>, name: &str) -> Option<PathBuf> {
    match configured {
        Some(path) if path.exists() => Some(path.clone()),
        Some(_) => None,
        None => which::which(name).ok(),
    }
}

/// Seam for the external transcoding tool, so the pipeline can be tested
/// without ffmpeg installed.
#[async_trait::async_trait]
pub trait Transcode: Send + Sync {
    /// Convert `input` to a ProRes mezzanine file at `output`.
    ///
    /// On failure no partial output file is left behind.
    async fn convert(&self, input: &Path, output: &Path, profile: u8) -> Result<()>;

    /// Extract duration and resolution from a media file.
    async fn probe(&self, input: &Path) -> Result<MediaProbe>;
}

/// [`Transcode`] implementation backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
    timeout: Duration,
}

impl FfmpegTranscoder {
    /// Discover tools from config paths or `PATH`. Missing tools only fail
    /// at the point of use.
    pub fn discover(config: &TranscodeConfig) -> Self {
        Self {
            ffmpeg: resolve_tool(&config.ffmpeg_path, "ffmpeg"),
            ffprobe: resolve_tool(&config.ffprobe_path, "ffprobe"),
            timeout: config.timeout(),
        }
    }

    fn require(&self, name: &'static str) -> Result<&Path> {
        let path = match name {
            "ffmpeg" => self.ffmpeg.as_deref(),
            _ => self.ffprobe.as_deref(),
        };
        path.ok_or_else(|| Error::tool(name, "not found (install it or set its path in config)"))
    }
}

#[async_trait::async_trait]
impl Transcode for FfmpegTranscoder {
    async fn convert(&self, input: &Path, output: &Path, profile: u8) -> Result<()> {
        let ffmpeg = self.require("ffmpeg")?.to_path_buf();
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::info!(
            "Converting {} -> {} (prores profile {profile})",
            input.display(),
            output.display()
        );

        let args = prores_args(input, output, profile);
        let result = run_tool(&ffmpeg, &args, self.timeout).await;

        if result.is_err() {
            // A killed or failed ffmpeg leaves a truncated file; never let it
            // be mistaken for a finished artifact.
            let _ = tokio::fs::remove_file(output).await;
        }
        result.map(|_| ())
    }

    async fn probe(&self, input: &Path) -> Result<MediaProbe> {
        let ffprobe = self.require("ffprobe")?.to_path_buf();

        let mut args: Vec<String> = [
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(input.to_string_lossy().into_owned());

        let output = run_tool(&ffprobe, &args, self.timeout).await?;
        parse_probe_output(&output.stdout)
    }
}

/// ffmpeg argument list for a ProRes conversion.
fn prores_args(input: &Path, output: &Path, profile: u8) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-c:v".into(),
        "prores_ks".into(),
        "-profile:v".into(),
        profile.to_string(),
        "-vendor".into(),
        "apl0".into(),
        "-pix_fmt".into(),
        "yuv422p10le".into(),
        "-c:a".into(),
        "pcm_s16le".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Captured output of a finished tool process.
#[derive(Debug)]
struct ToolOutput {
    stdout: String,
    #[allow(dead_code)]
    stderr: String,
}

/// Run an external tool to completion, capturing output.
///
/// # Errors
///
/// - [`Error::ToolTimeout`] when the process exceeds `timeout`.
/// - [`Error::Tool`] on spawn failure or non-zero exit (with stderr).
async fn run_tool(program: &Path, args: &[String], timeout: Duration) -> Result<ToolOutput> {
    let tool_name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned());

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| Error::Tool {
        tool: tool_name.clone(),
        message: format!("failed to spawn: {e}"),
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(Error::Tool {
                tool: tool_name,
                message: format!("I/O error waiting for process: {e}"),
            })
        }
        Err(_elapsed) => {
            return Err(Error::ToolTimeout {
                tool: tool_name,
                timeout,
            })
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(Error::Tool {
            tool: tool_name,
            message: format!("exited with status {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

// ---------------------------------------------------------------------------
// ffprobe JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_probe_output(stdout: &str) -> Result<MediaProbe> {
    let ff: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| Error::tool("ffprobe", format!("JSON parse error: {e}")))?;

    let duration = ff
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|secs| *secs >= 0.0)
        .map(Duration::from_secs_f64);

    let video = ff
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| Error::tool("ffprobe", "no video stream found"))?;

    Ok(MediaProbe {
        duration,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
    })
}
