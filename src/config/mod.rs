mod types;

pub use types::*;

use std::path::Path;

use crate::error::{Error, Result};

/// Environment variables that can supply provider API keys, so credentials
/// never need to live in the config file.
const VIDEOGEN_KEY_VAR: &str = "SCENELOOM_VIDEOGEN_API_KEY";
const SPEECH_KEY_VAR: &str = "SCENELOOM_SPEECH_API_KEY";
const LIPSYNC_KEY_VAR: &str = "SCENELOOM_LIPSYNC_API_KEY";

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read config file {path:?}: {e}")))?;

    let mut config: Config = toml::from_str(&content)
        .map_err(|e| Error::config(format!("failed to parse config file {path:?}: {e}")))?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations, or return defaults when none exists.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./sceneloom.toml",
        "./config.toml",
        "~/.config/sceneloom/config.toml",
        "/etc/sceneloom/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Fill in provider API keys from the environment when the config file left
/// them blank. The environment wins over an empty field, never over an
/// explicit one.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(videogen) = config.videogen.as_mut() {
        if videogen.api_key.is_empty() {
            if let Some(key) = lookup(VIDEOGEN_KEY_VAR) {
                videogen.api_key = key;
            }
        }
    }
    if let Some(speech) = config.speech.as_mut() {
        if speech.api_key.is_empty() {
            if let Some(key) = lookup(SPEECH_KEY_VAR) {
                speech.api_key = key;
            }
        }
    }
    if let Some(lipsync) = config.lipsync.as_mut() {
        if lipsync.api_key.is_empty() {
            if let Some(key) = lookup(LIPSYNC_KEY_VAR) {
                lipsync.api_key = key;
            }
        }
    }
}

/// Validate configuration before any work starts.
///
/// Configured providers must carry complete credentials; whether a provider
/// is *required* depends on the scene and is checked by the orchestrator's
/// per-scene preflight.
fn validate_config(config: &Config) -> Result<()> {
    if let Some(videogen) = &config.videogen {
        validate_provider("videogen", &videogen.base_url, &videogen.api_key, VIDEOGEN_KEY_VAR)?;
    }
    if let Some(speech) = &config.speech {
        validate_provider("speech", &speech.base_url, &speech.api_key, SPEECH_KEY_VAR)?;
    }
    if let Some(lipsync) = &config.lipsync {
        validate_provider("lipsync", &lipsync.base_url, &lipsync.api_key, LIPSYNC_KEY_VAR)?;
    }

    if config.transcode.prores_profile > 3 {
        return Err(Error::config(format!(
            "transcode.prores_profile must be 0..=3, got {}",
            config.transcode.prores_profile
        )));
    }
    if config.transcode.timeout_secs == 0 {
        return Err(Error::config("transcode.timeout_secs must be greater than 0"));
    }
    if config.poll.max_wait_secs == 0 {
        return Err(Error::config("poll.max_wait_secs must be greater than 0"));
    }

    Ok(())
}

fn validate_provider(name: &str, base_url: &str, api_key: &str, key_var: &str) -> Result<()> {
    if base_url.is_empty() {
        return Err(Error::config(format!("{name}.base_url is not set")));
    }
    if api_key.is_empty() {
        return Err(Error::config(format!(
            "{name}.api_key is not set (config file or {key_var})"
        )));
    }
    Ok(())
}
