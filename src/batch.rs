//! Batch driver.
//!
//! Thin layer over the orchestrator: load an ordered list of scene
//! configurations from a JSON file and process them one by one. A failing
//! scene never aborts the batch; every entry produces an outcome.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::{Orchestrator, SceneOutcome};
use crate::prompt::SceneConfig;

/// On-disk shape of a batch input file.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchFile {
    pub scenes: Vec<SceneConfig>,
}

/// Per-batch overrides applied to every scene (CLI flags).
#[derive(Debug, Clone, Default)]
pub struct BatchOverrides {
    /// Replaces each scene's voice unless the scene already sets one.
    pub voice_id: Option<String>,
    /// Forces lip-sync off for the whole batch.
    pub skip_lipsync: bool,
}

/// Load and decode a batch input file.
pub fn load_batch_file(path: &Path) -> Result<Vec<SceneConfig>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read batch file {path:?}: {e}")))?;
    let batch: BatchFile = serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("failed to parse batch file {path:?}: {e}")))?;
    Ok(batch.scenes)
}

/// Apply batch-level overrides to a scene config.
pub fn apply_overrides(mut scene: SceneConfig, overrides: &BatchOverrides) -> SceneConfig {
    if scene.voice_id.is_none() {
        scene.voice_id = overrides.voice_id.clone();
    }
    if overrides.skip_lipsync {
        scene.skip_lipsync = true;
    }
    scene
}

/// Process every scene in order, collecting one outcome per entry.
pub async fn run_batch(
    orchestrator: &Orchestrator,
    scenes: Vec<SceneConfig>,
    overrides: &BatchOverrides,
) -> Vec<SceneOutcome> {
    let total = scenes.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, scene) in scenes.into_iter().enumerate() {
        let scene = apply_overrides(scene, overrides);
        tracing::info!("Batch scene {}/{total}: {}", i + 1, scene.scene_id);

        let outcome = orchestrator.run_scene(&scene).await;
        if let Some(failure) = &outcome.failure {
            tracing::warn!(
                "Scene {} failed ({}): {}",
                outcome.scene_id,
                failure.kind,
                failure.message
            );
        }
        outcomes.push(outcome);
    }

    outcomes
}
