//! On-disk scene storage.
//!
//! Each scene owns one directory under `<project_root>/scenes/` holding its
//! stage artifacts and a `record.json` with the persisted [`SceneRecord`].
//! The record is the single source of truth for resumability.
//!
//! No locking is provided: one writer per scene id is an invariant the
//! caller must uphold. Distinct scene ids are safe to process concurrently
//! because their directories are disjoint.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name of the per-scene metadata record.
const RECORD_FILE: &str = "record.json";

/// Processing status of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    Pending,
    VideoGenerating,
    VideoReady,
    ProresConverting,
    DialogueSynthesizing,
    LipSyncing,
    FinalConverting,
    Completed,
    Failed,
}

impl std::fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SceneStatus::Pending => "pending",
            SceneStatus::VideoGenerating => "video_generating",
            SceneStatus::VideoReady => "video_ready",
            SceneStatus::ProresConverting => "prores_converting",
            SceneStatus::DialogueSynthesizing => "dialogue_synthesizing",
            SceneStatus::LipSyncing => "lip_syncing",
            SceneStatus::FinalConverting => "final_converting",
            SceneStatus::Completed => "completed",
            SceneStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One discrete artifact-producing step of the pipeline.
///
/// Declaration order matches pipeline order, so the derived `Ord` keeps
/// artifact maps sorted the way the stages run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RawVideo,
    MezzanineVideo,
    DialogueAudio,
    SyncedVideo,
    FinalVideo,
}

impl Stage {
    /// Conventional artifact file name for this stage.
    pub fn file_name(&self, scene_id: &str) -> String {
        match self {
            Stage::RawVideo => format!("{scene_id}_raw.mp4"),
            Stage::MezzanineVideo => format!("{scene_id}_prores.mov"),
            Stage::DialogueAudio => format!("{scene_id}_dialogue.mp3"),
            Stage::SyncedVideo => format!("{scene_id}_synced.mp4"),
            Stage::FinalVideo => format!("{scene_id}_final_prores.mov"),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::RawVideo => "video generation",
            Stage::MezzanineVideo => "mezzanine conversion",
            Stage::DialogueAudio => "dialogue synthesis",
            Stage::SyncedVideo => "lip sync",
            Stage::FinalVideo => "final conversion",
        };
        f.write_str(s)
    }
}

/// Error detail from the most recent failure.
///
/// `stage` is `None` for pre-flight failures (validation, missing provider
/// configuration) that happen before any stage runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Stable error kind name, see [`crate::error::Error::kind`].
    pub kind: String,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Option<Stage>, error: &crate::error::Error) -> Self {
        Self {
            stage,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    /// Human-readable name of what failed.
    pub fn stage_name(&self) -> String {
        match self.stage {
            Some(stage) => stage.to_string(),
            None => "pre-flight".to_string(),
        }
    }
}

/// Persisted per-scene metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecord {
    pub scene_id: String,
    pub status: SceneStatus,

    /// Stage → artifact path, for every artifact produced so far.
    #[serde(default)]
    pub artifacts: BTreeMap<Stage, PathBuf>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set when `status` is failed; cleared on the next successful write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<StageError>,
}

impl SceneRecord {
    /// Fresh record for a scene that has not started processing.
    pub fn new(scene_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            scene_id: scene_id.into(),
            status: SceneStatus::Pending,
            artifacts: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            last_error: None,
        }
    }
}

/// Manages the directory-per-scene layout under a project root.
#[derive(Debug, Clone)]
pub struct SceneStore {
    scenes_dir: PathBuf,
}

impl SceneStore {
    /// Open (and create if needed) the store under `project_root`.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self> {
        let scenes_dir = project_root.as_ref().join("scenes");
        fs::create_dir_all(&scenes_dir)?;
        tracing::debug!("Scene store at {}", scenes_dir.display());
        Ok(Self { scenes_dir })
    }

    /// Ensure the scene directory exists. Idempotent.
    pub fn create_scene(&self, scene_id: &str) -> Result<PathBuf> {
        let dir = self.scene_dir(scene_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Directory owned by a scene. Pure path computation, no I/O.
    pub fn scene_dir(&self, scene_id: &str) -> PathBuf {
        self.scenes_dir.join(scene_id)
    }

    /// Conventional path for a stage artifact. Pure, no I/O.
    pub fn artifact_path(&self, scene_id: &str, stage: Stage) -> PathBuf {
        self.scene_dir(scene_id).join(stage.file_name(scene_id))
    }

    /// Check whether a stage artifact is already on disk and usable.
    ///
    /// # Errors
    ///
    /// A zero-length file is treated as a truncated write and surfaces
    /// [`Error::Storage`]; it must be cleaned up manually rather than
    /// silently reused or regenerated.
    pub fn artifact_on_disk(&self, scene_id: &str, stage: Stage) -> Result<Option<PathBuf>> {
        let path = self.artifact_path(scene_id, stage);
        match fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => Ok(Some(path)),
            Ok(_) => Err(Error::storage(format!(
                "artifact {} is empty (truncated write?); remove it to re-run the stage",
                path.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the persisted record for a scene.
    ///
    /// Returns `Ok(None)` when the scene has no record yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] with a corrupt-metadata message when the
    /// record file exists but cannot be parsed.
    pub fn read_record(&self, scene_id: &str) -> Result<Option<SceneRecord>> {
        let path = self.record_path(scene_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_str(&content).map_err(|e| {
            Error::storage(format!(
                "corrupt scene record {}: {e}",
                path.display()
            ))
        })?;
        Ok(Some(record))
    }

    /// Persist a full record, overwriting any previous one.
    ///
    /// Refreshes `updated_at`. Callers must read-modify-write; this is not a
    /// merge.
    pub fn write_record(&self, record: &mut SceneRecord) -> Result<()> {
        record.updated_at = Utc::now();

        let path = self.record_path(&record.scene_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| Error::storage(format!("failed to encode scene record: {e}")))?;
        fs::write(&path, json)?;

        tracing::debug!(
            scene_id = %record.scene_id,
            status = %record.status,
            "wrote scene record"
        );
        Ok(())
    }

    /// Enumerate scene ids currently on disk (directory enumeration order).
    pub fn list_scenes(&self) -> Result<Vec<String>> {
        let mut scenes = Vec::new();
        for entry in fs::read_dir(&self.scenes_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                scenes.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(scenes)
    }

    fn record_path(&self, scene_id: &str) -> PathBuf {
        self.scene_dir(scene_id).join(RECORD_FILE)
    }
}
