//! Unified error type for sceneloom.
//!
//! All modules funnel their failures into [`Error`]. The pipeline catches
//! every variant at its own boundary and folds it into a scene outcome, so
//! errors only escape to the CLI for pre-flight problems (config, batch file
//! I/O).

use std::time::Duration;

/// Unified error type covering all failure modes in sceneloom.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid configuration, detected before any work starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A scene configuration failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A remote provider rejected our credentials.
    #[error("Authentication rejected by {provider}: {message}")]
    RemoteAuth {
        /// Provider name (e.g. "videogen").
        provider: String,
        /// Human-readable detail from the provider.
        message: String,
    },

    /// A remote provider rejected the request for quota/rate-limit reasons.
    #[error("Quota exhausted on {provider}: {message}")]
    RemoteQuota {
        provider: String,
        message: String,
    },

    /// A remote request was rejected, malformed, or failed in transit.
    #[error("Request to {provider} failed: {message}")]
    RemoteRequest {
        provider: String,
        message: String,
    },

    /// A remote job did not reach a terminal state within the poll budget.
    #[error("{provider} job did not finish within {elapsed:?}")]
    RemoteTimeout {
        provider: String,
        /// Wall-clock time spent polling before giving up.
        elapsed: Duration,
    },

    /// An external tool (ffmpeg, ffprobe) failed.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description, usually trimmed stderr.
        message: String,
    },

    /// An external tool exceeded its configured execution time.
    #[error("Tool [{tool}] timed out after {timeout:?}")]
    ToolTimeout {
        tool: String,
        timeout: Duration,
    },

    /// Scene record or artifact bookkeeping failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Stable short name for this error kind, used in batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Validation(_) => "validation",
            Error::RemoteAuth { .. } => "auth",
            Error::RemoteQuota { .. } => "quota",
            Error::RemoteRequest { .. } => "remote",
            Error::RemoteTimeout { .. } => "timeout",
            Error::Tool { .. } => "tool",
            Error::ToolTimeout { .. } => "tool-timeout",
            Error::Storage(_) => "storage",
            Error::Io { .. } => "io",
        }
    }

    /// Convenience constructor for [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Convenience constructor for [`Error::RemoteAuth`].
    pub fn remote_auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::RemoteAuth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::RemoteQuota`].
    pub fn remote_quota(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::RemoteQuota {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::RemoteRequest`].
    pub fn remote_request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::RemoteRequest {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display() {
        let err = Error::config("videogen.api_key is not set");
        assert_eq!(
            err.to_string(),
            "Configuration error: videogen.api_key is not set"
        );
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn validation_display() {
        let err = Error::validation("cinematic_description is required");
        assert_eq!(
            err.to_string(),
            "Validation error: cinematic_description is required"
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn remote_auth_display() {
        let err = Error::remote_auth("videogen", "bad token");
        assert_eq!(
            err.to_string(),
            "Authentication rejected by videogen: bad token"
        );
        assert_eq!(err.kind(), "auth");
    }

    #[test]
    fn remote_quota_display() {
        let err = Error::remote_quota("speech", "monthly character limit reached");
        assert!(err.to_string().contains("Quota exhausted on speech"));
        assert_eq!(err.kind(), "quota");
    }

    #[test]
    fn remote_timeout_display() {
        let err = Error::RemoteTimeout {
            provider: "lipsync".into(),
            elapsed: Duration::from_secs(600),
        };
        assert!(err.to_string().contains("lipsync"));
        assert!(err.to_string().contains("600"));
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.kind(), "tool");
    }

    #[test]
    fn tool_timeout_distinct_from_tool_failure() {
        let timeout = Error::ToolTimeout {
            tool: "ffmpeg".into(),
            timeout: Duration::from_secs(300),
        };
        let failure = Error::tool("ffmpeg", "boom");
        assert_ne!(timeout.kind(), failure.kind());
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn storage_display() {
        let err = Error::storage("corrupt scene record");
        assert_eq!(err.to_string(), "Storage error: corrupt scene record");
        assert_eq!(err.kind(), "storage");
    }
}
