//! Scene and prompt data model.
//!
//! A [`VideoPrompt`] is the structured description of a single shot; it is
//! composed into one request string before submission to the video
//! generation provider. A [`SceneConfig`] wraps a prompt with the scene
//! identity and the per-scene pipeline switches.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Structured video generation prompt.
///
/// Only `cinematic_description` is required; the optional fields are
/// appended to the request string with fixed labels, in declaration order,
/// so composition is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoPrompt {
    /// Main visual description of the scene.
    pub cinematic_description: String,

    /// Character appearance and consistency notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_consistency: Option<String>,

    /// Camera movement and framing instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_movement: Option<String>,

    /// Lighting and visual style guidance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_style: Option<String>,

    /// Emotional tone and facial performance notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_performance: Option<String>,

    /// Dialogue text; presence enables the speech and lip-sync stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_text: Option<String>,
}

impl VideoPrompt {
    /// Compose the structured fields into a single generation request string.
    pub fn compose(&self) -> String {
        let mut parts = vec![self.cinematic_description.clone()];

        if let Some(s) = non_empty(&self.character_consistency) {
            parts.push(format!("Character: {s}"));
        }
        if let Some(s) = non_empty(&self.camera_movement) {
            parts.push(format!("Camera: {s}"));
        }
        if let Some(s) = non_empty(&self.lighting_style) {
            parts.push(format!("Lighting: {s}"));
        }
        if let Some(s) = non_empty(&self.emotion_performance) {
            parts.push(format!("Performance: {s}"));
        }

        parts.join(". ")
    }

    /// Dialogue text with surrounding whitespace stripped, empty if unset.
    pub fn dialogue(&self) -> &str {
        self.dialogue_text.as_deref().map(str::trim).unwrap_or("")
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Configuration for one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Scene identifier, used as the directory and file-name stem.
    pub scene_id: String,

    /// The generation prompt for this scene.
    pub prompt: VideoPrompt,

    /// Overrides the configured default voice for dialogue synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    /// Existing video (local path or remote URI) to extend instead of
    /// generating from scratch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_video: Option<String>,

    /// Keep the synthesized audio but skip the lip-sync stage.
    #[serde(default)]
    pub skip_lipsync: bool,
}

impl SceneConfig {
    /// Validate the scene configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the prompt description is empty or
    /// the scene id is not filesystem-safe.
    pub fn validate(&self) -> Result<()> {
        validate_scene_id(&self.scene_id)?;

        if self.prompt.cinematic_description.trim().is_empty() {
            return Err(Error::validation(format!(
                "scene '{}': cinematic_description is required",
                self.scene_id
            )));
        }

        Ok(())
    }
}

/// Check that a scene id is safe to use as a directory and file-name stem.
pub fn validate_scene_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::validation("scene_id must not be empty"));
    }
    if id.starts_with('.') {
        return Err(Error::validation(format!(
            "scene_id '{id}' must not start with a dot"
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(Error::validation(format!(
            "scene_id '{id}' may only contain alphanumerics, '.', '_' and '-'"
        )));
    }
    Ok(())
}
