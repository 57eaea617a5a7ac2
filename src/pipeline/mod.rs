//! Pipeline orchestrator.
//!
//! Drives one scene through the ordered stage sequence:
//!
//! ```text
//! pending -> video_generating -> video_ready -> prores_converting
//!         -> [dialogue_synthesizing -> lip_syncing ->] final_converting
//!         -> completed
//! ```
//!
//! with `failed` reachable from any non-terminal state. The dialogue and
//! lip-sync stages are conditional on the scene's dialogue text and
//! `skip_lipsync` flag.
//!
//! Every stage first checks the scene store for an existing artifact and
//! reuses it, which makes re-invocation resumable: a crash between stages
//! loses at most the in-flight stage. The orchestrator never propagates
//! errors across its boundary; every failure is folded into the returned
//! [`SceneOutcome`] and the persisted record.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::clients::{
    wait_for_completion, GenerationRequest, HttpLipSync, HttpSpeech, HttpVideoGen, LipSyncClient,
    PollPolicy, SpeechClient, VideoGenClient,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::prompt::SceneConfig;
use crate::store::{SceneRecord, SceneStatus, SceneStore, Stage, StageError};
use crate::transcode::{FfmpegTranscoder, Transcode};

/// Knobs the orchestrator needs beyond its collaborators.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub poll: PollPolicy,
    pub prores_profile: u8,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            prores_profile: 2,
        }
    }
}

/// Result of running one scene through the pipeline.
#[derive(Debug, Clone)]
pub struct SceneOutcome {
    pub scene_id: String,
    pub status: SceneStatus,
    /// Stage → artifact path for everything produced (or reused) this run.
    pub artifacts: BTreeMap<Stage, PathBuf>,
    /// Set when `status` is failed.
    pub failure: Option<StageError>,
}

impl SceneOutcome {
    pub fn is_success(&self) -> bool {
        self.status == SceneStatus::Completed
    }

    /// Path of the final mezzanine artifact, when the scene completed.
    pub fn final_artifact(&self) -> Option<&PathBuf> {
        self.artifacts.get(&Stage::FinalVideo)
    }

    fn failed(scene_id: String, artifacts: BTreeMap<Stage, PathBuf>, failure: StageError) -> Self {
        Self {
            scene_id,
            status: SceneStatus::Failed,
            artifacts,
            failure: Some(failure),
        }
    }
}

/// Sequences the remote calls and transcodes for one scene at a time.
pub struct Orchestrator {
    store: SceneStore,
    videogen: Arc<dyn VideoGenClient>,
    speech: Option<Arc<dyn SpeechClient>>,
    lipsync: Option<Arc<dyn LipSyncClient>>,
    transcoder: Arc<dyn Transcode>,
    settings: PipelineSettings,
}

impl Orchestrator {
    /// Assemble an orchestrator from explicit collaborators (tests use this
    /// with fakes).
    pub fn new(
        store: SceneStore,
        videogen: Arc<dyn VideoGenClient>,
        speech: Option<Arc<dyn SpeechClient>>,
        lipsync: Option<Arc<dyn LipSyncClient>>,
        transcoder: Arc<dyn Transcode>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            videogen,
            speech,
            lipsync,
            transcoder,
            settings,
        }
    }

    /// Build the production orchestrator from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the video generation provider is not
    /// configured; speech and lip-sync are optional here and checked
    /// per-scene by the preflight.
    pub fn from_config(config: &Config) -> Result<Self> {
        let videogen_cfg = config
            .videogen
            .as_ref()
            .ok_or_else(|| Error::config("videogen provider is not configured"))?;

        let videogen: Arc<dyn VideoGenClient> = Arc::new(HttpVideoGen::new(videogen_cfg)?);
        let speech = match &config.speech {
            Some(cfg) => Some(Arc::new(HttpSpeech::new(cfg)?) as Arc<dyn SpeechClient>),
            None => None,
        };
        let lipsync = match &config.lipsync {
            Some(cfg) => Some(Arc::new(HttpLipSync::new(cfg)?) as Arc<dyn LipSyncClient>),
            None => None,
        };

        Ok(Self {
            store: SceneStore::new(&config.project_root)?,
            videogen,
            speech,
            lipsync,
            transcoder: Arc::new(FfmpegTranscoder::discover(&config.transcode)),
            settings: PipelineSettings {
                poll: PollPolicy::new(
                    Duration::from_secs(config.poll.interval_secs),
                    Duration::from_secs(config.poll.max_wait_secs),
                ),
                prores_profile: config.transcode.prores_profile,
            },
        })
    }

    /// Access the underlying store (used by the status report).
    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Run one scene through the pipeline.
    ///
    /// Never panics or returns an error: all failures produce a `failed`
    /// outcome with the failing stage and error detail, and are persisted to
    /// the scene record when the scene directory is usable.
    pub async fn run_scene(&self, config: &SceneConfig) -> SceneOutcome {
        let scene_id = config.scene_id.clone();
        tracing::info!("=== Processing {scene_id} ===");

        // Validation happens before anything touches the disk or network;
        // an unsafe scene id must not create a directory.
        if let Err(e) = config.validate() {
            tracing::error!("{scene_id}: {e}");
            return SceneOutcome::failed(scene_id, BTreeMap::new(), StageError::new(None, &e));
        }

        let mut record = match self
            .store
            .create_scene(&scene_id)
            .and_then(|_| self.store.read_record(&scene_id))
        {
            Ok(Some(record)) => record,
            Ok(None) => SceneRecord::new(&scene_id),
            Err(e) => {
                tracing::error!("{scene_id}: cannot open scene store: {e}");
                return SceneOutcome::failed(scene_id, BTreeMap::new(), StageError::new(None, &e));
            }
        };

        match self.run_stages(config, &mut record).await {
            Ok(()) => {
                tracing::info!("=== {scene_id} completed ===");
                SceneOutcome {
                    scene_id,
                    status: record.status,
                    artifacts: record.artifacts,
                    failure: None,
                }
            }
            Err(failure) => {
                tracing::error!(
                    "{scene_id} failed at {}: {}",
                    failure.stage_name(),
                    failure.message
                );
                record.status = SceneStatus::Failed;
                record.last_error = Some(failure.clone());
                if let Err(e) = self.store.write_record(&mut record) {
                    tracing::error!("{scene_id}: failed to persist failure record: {e}");
                }
                SceneOutcome::failed(scene_id, record.artifacts, failure)
            }
        }
    }

    /// The linear stage sequence. Errors carry the stage they belong to.
    async fn run_stages(
        &self,
        config: &SceneConfig,
        record: &mut SceneRecord,
    ) -> std::result::Result<(), StageError> {
        let scene_id = &config.scene_id;
        let dialogue = config.prompt.dialogue().to_string();
        let wants_speech = !dialogue.is_empty();
        let wants_lipsync = wants_speech && !config.skip_lipsync;

        // Fail fast on missing provider configuration before any remote call.
        self.preflight(scene_id, wants_speech, wants_lipsync)
            .map_err(|e| StageError::new(None, &e))?;

        // Stage 1: video generation.
        let raw = self
            .ensure_raw_video(config, record)
            .await
            .map_err(|e| StageError::new(Some(Stage::RawVideo), &e))?;
        self.commit(record, Stage::RawVideo, raw.clone(), SceneStatus::VideoReady)?;

        // Stage 2: mezzanine conversion.
        let mezzanine = self
            .ensure_converted(scene_id, record, Stage::MezzanineVideo, &raw)
            .await
            .map_err(|e| StageError::new(Some(Stage::MezzanineVideo), &e))?;
        self.commit(
            record,
            Stage::MezzanineVideo,
            mezzanine.clone(),
            SceneStatus::ProresConverting,
        )?;

        // Branch: no dialogue means the mezzanine goes straight to stage 6.
        let mut final_input = mezzanine.clone();

        if wants_speech {
            // Stage 4: dialogue synthesis. Dialogue was requested, so a
            // failure here is fatal; never silently fall back to video-only.
            let audio = self
                .ensure_dialogue_audio(config, record, &dialogue)
                .await
                .map_err(|e| StageError::new(Some(Stage::DialogueAudio), &e))?;
            self.commit(
                record,
                Stage::DialogueAudio,
                audio.clone(),
                SceneStatus::DialogueSynthesizing,
            )?;

            if wants_lipsync {
                // Stage 5: lip sync fuses the mezzanine video and the audio.
                let synced = self
                    .ensure_synced_video(config, record, &mezzanine, &audio)
                    .await
                    .map_err(|e| StageError::new(Some(Stage::SyncedVideo), &e))?;
                self.commit(
                    record,
                    Stage::SyncedVideo,
                    synced.clone(),
                    SceneStatus::LipSyncing,
                )?;
                final_input = synced;
            } else {
                tracing::info!("{scene_id}: skip_lipsync set, audio kept but not muxed");
            }
        } else {
            tracing::info!("{scene_id}: no dialogue, skipping speech and lip-sync");
        }

        // Stage 6: final conversion.
        let final_path = self
            .ensure_converted(scene_id, record, Stage::FinalVideo, &final_input)
            .await
            .map_err(|e| StageError::new(Some(Stage::FinalVideo), &e))?;

        // Best-effort sanity report on the finished mezzanine.
        match self.transcoder.probe(&final_path).await {
            Ok(probe) => tracing::info!(
                "{scene_id}: final mezzanine {}x{}, duration {:?}",
                probe.width,
                probe.height,
                probe.duration
            ),
            Err(e) => tracing::warn!("{scene_id}: could not probe final artifact: {e}"),
        }

        record.artifacts.insert(Stage::FinalVideo, final_path);
        record.status = SceneStatus::Completed;
        record.last_error = None;
        self.store
            .write_record(record)
            .map_err(|e| StageError::new(Some(Stage::FinalVideo), &e))?;

        Ok(())
    }

    fn preflight(&self, scene_id: &str, wants_speech: bool, wants_lipsync: bool) -> Result<()> {
        if wants_speech && self.speech.is_none() {
            return Err(Error::config(format!(
                "scene '{scene_id}' has dialogue but the speech provider is not configured"
            )));
        }
        if wants_lipsync && self.lipsync.is_none() {
            return Err(Error::config(format!(
                "scene '{scene_id}' needs lip-sync but the lipsync provider is not configured"
            )));
        }
        Ok(())
    }

    /// Record a produced (or reused) artifact and the stage's status.
    fn commit(
        &self,
        record: &mut SceneRecord,
        stage: Stage,
        path: PathBuf,
        status: SceneStatus,
    ) -> std::result::Result<(), StageError> {
        record.artifacts.insert(stage, path);
        record.status = status;
        self.store
            .write_record(record)
            .map_err(|e| StageError::new(Some(stage), &e))
    }

    /// Persist a status transition before starting a stage's work.
    fn enter(&self, record: &mut SceneRecord, status: SceneStatus) -> Result<()> {
        record.status = status;
        self.store.write_record(record)
    }

    async fn ensure_raw_video(
        &self,
        config: &SceneConfig,
        record: &mut SceneRecord,
    ) -> Result<PathBuf> {
        let scene_id = &config.scene_id;
        if let Some(existing) = self.store.artifact_on_disk(scene_id, Stage::RawVideo)? {
            tracing::info!("{scene_id}: reusing existing raw video");
            return Ok(existing);
        }

        self.enter(record, SceneStatus::VideoGenerating)?;

        let prompt = config.prompt.compose();
        let request = match &config.input_video {
            Some(source) => GenerationRequest::Extend {
                source: source.clone(),
                prompt,
            },
            None => GenerationRequest::Prompt(prompt),
        };

        let job = self.videogen.submit(&request).await?;
        tracing::info!("{scene_id}: videogen job {job} submitted");

        let url =
            wait_for_completion("videogen", &self.settings.poll, || self.videogen.poll(&job))
                .await?;

        let dest = self.store.artifact_path(scene_id, Stage::RawVideo);
        self.videogen.download(&url, &dest).await?;
        Ok(dest)
    }

    async fn ensure_converted(
        &self,
        scene_id: &str,
        record: &mut SceneRecord,
        stage: Stage,
        input: &Path,
    ) -> Result<PathBuf> {
        if let Some(existing) = self.store.artifact_on_disk(scene_id, stage)? {
            tracing::info!("{scene_id}: reusing existing {stage} artifact");
            return Ok(existing);
        }

        let status = match stage {
            Stage::FinalVideo => SceneStatus::FinalConverting,
            _ => SceneStatus::ProresConverting,
        };
        self.enter(record, status)?;

        let output = self.store.artifact_path(scene_id, stage);
        self.transcoder
            .convert(input, &output, self.settings.prores_profile)
            .await?;
        Ok(output)
    }

    async fn ensure_dialogue_audio(
        &self,
        config: &SceneConfig,
        record: &mut SceneRecord,
        dialogue: &str,
    ) -> Result<PathBuf> {
        let scene_id = &config.scene_id;
        if let Some(existing) = self.store.artifact_on_disk(scene_id, Stage::DialogueAudio)? {
            tracing::info!("{scene_id}: reusing existing dialogue audio");
            return Ok(existing);
        }

        let client = self
            .speech
            .as_deref()
            .ok_or_else(|| Error::config("speech provider is not configured"))?;

        self.enter(record, SceneStatus::DialogueSynthesizing)?;

        let audio = client
            .synthesize(dialogue, config.voice_id.as_deref())
            .await?;

        let dest = self.store.artifact_path(scene_id, Stage::DialogueAudio);
        tokio::fs::write(&dest, &audio).await?;
        Ok(dest)
    }

    async fn ensure_synced_video(
        &self,
        config: &SceneConfig,
        record: &mut SceneRecord,
        video: &Path,
        audio: &Path,
    ) -> Result<PathBuf> {
        let scene_id = &config.scene_id;
        if let Some(existing) = self.store.artifact_on_disk(scene_id, Stage::SyncedVideo)? {
            tracing::info!("{scene_id}: reusing existing synced video");
            return Ok(existing);
        }

        let client = self
            .lipsync
            .as_deref()
            .ok_or_else(|| Error::config("lipsync provider is not configured"))?;

        self.enter(record, SceneStatus::LipSyncing)?;

        let job = client.submit(video, audio).await?;
        tracing::info!("{scene_id}: lipsync job {job} submitted");

        let url = wait_for_completion("lipsync", &self.settings.poll, || client.poll(&job)).await?;

        let dest = self.store.artifact_path(scene_id, Stage::SyncedVideo);
        client.download(&url, &dest).await?;
        Ok(dest)
    }
}
