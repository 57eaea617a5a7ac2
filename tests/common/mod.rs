//! Shared fakes for pipeline integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use sceneloom::clients::{
    GenerationRequest, JobId, JobStatus, LipSyncClient, PollPolicy, SpeechClient, VideoGenClient,
};
use sceneloom::error::Result;
use sceneloom::pipeline::{Orchestrator, PipelineSettings};
use sceneloom::prompt::{SceneConfig, VideoPrompt};
use sceneloom::store::SceneStore;
use sceneloom::transcode::{MediaProbe, Transcode};

fn write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

pub struct FakeVideoGen {
    pub submits: AtomicUsize,
    pub downloads: AtomicUsize,
    poll_result: JobStatus,
}

impl FakeVideoGen {
    pub fn succeeding() -> Self {
        Self {
            submits: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            poll_result: JobStatus::Done {
                download_url: "https://cdn.test/raw.mp4".into(),
            },
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            poll_result: JobStatus::Failed {
                reason: reason.into(),
            },
            ..Self::succeeding()
        }
    }

    pub fn pending_forever() -> Self {
        Self {
            poll_result: JobStatus::Pending,
            ..Self::succeeding()
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoGenClient for FakeVideoGen {
    async fn submit(&self, _request: &GenerationRequest) -> Result<JobId> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(JobId("vg-job-1".into()))
    }

    async fn poll(&self, _job: &JobId) -> Result<JobStatus> {
        Ok(self.poll_result.clone())
    }

    async fn download(&self, _url: &str, dest: &Path) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        write_file(dest, b"raw video bytes")?;
        Ok(())
    }
}

pub struct FakeSpeech {
    pub calls: AtomicUsize,
    pub voices_seen: Mutex<Vec<Option<String>>>,
}

impl FakeSpeech {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            voices_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechClient for FakeSpeech {
    async fn synthesize(&self, _text: &str, voice_id: Option<&str>) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices_seen
            .lock()
            .unwrap()
            .push(voice_id.map(str::to_string));
        Ok(Bytes::from_static(b"audio bytes"))
    }
}

pub struct FakeLipSync {
    pub submits: AtomicUsize,
    poll_result: JobStatus,
}

impl FakeLipSync {
    pub fn succeeding() -> Self {
        Self {
            submits: AtomicUsize::new(0),
            poll_result: JobStatus::Done {
                download_url: "https://cdn.test/synced.mp4".into(),
            },
        }
    }

    pub fn pending_forever() -> Self {
        Self {
            poll_result: JobStatus::Pending,
            ..Self::succeeding()
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LipSyncClient for FakeLipSync {
    async fn submit(&self, _video: &Path, _audio: &Path) -> Result<JobId> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(JobId("ls-job-1".into()))
    }

    async fn poll(&self, _job: &JobId) -> Result<JobStatus> {
        Ok(self.poll_result.clone())
    }

    async fn download(&self, _url: &str, dest: &Path) -> Result<()> {
        write_file(dest, b"synced video bytes")?;
        Ok(())
    }
}

/// Fake transcoder that records (input, output) pairs and writes a small
/// output file.
pub struct FakeTranscoder {
    pub conversions: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self {
            conversions: Mutex::new(Vec::new()),
        }
    }

    pub fn convert_count(&self) -> usize {
        self.conversions.lock().unwrap().len()
    }

    /// Input path of the most recent conversion.
    pub fn last_input(&self) -> Option<PathBuf> {
        self.conversions
            .lock()
            .unwrap()
            .last()
            .map(|(input, _)| input.clone())
    }
}

#[async_trait]
impl Transcode for FakeTranscoder {
    async fn convert(&self, input: &Path, output: &Path, _profile: u8) -> Result<()> {
        self.conversions
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        write_file(output, b"prores bytes")?;
        Ok(())
    }

    async fn probe(&self, _input: &Path) -> Result<MediaProbe> {
        Ok(MediaProbe {
            duration: Some(Duration::from_secs(5)),
            width: 1280,
            height: 720,
        })
    }
}

/// One fully wired orchestrator over a temp project root, with handles to
/// every fake for assertions.
pub struct Harness {
    pub tmp: tempfile::TempDir,
    pub store: SceneStore,
    pub videogen: Arc<FakeVideoGen>,
    pub speech: Arc<FakeSpeech>,
    pub lipsync: Arc<FakeLipSync>,
    pub transcoder: Arc<FakeTranscoder>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(FakeVideoGen::succeeding(), FakeLipSync::succeeding(), true)
    }

    pub fn with_videogen(videogen: FakeVideoGen) -> Self {
        Self::build(videogen, FakeLipSync::succeeding(), true)
    }

    /// Harness with no speech/lipsync providers configured.
    pub fn without_dialogue_providers() -> Self {
        Self::build(FakeVideoGen::succeeding(), FakeLipSync::succeeding(), false)
    }

    fn build(videogen: FakeVideoGen, lipsync: FakeLipSync, with_dialogue: bool) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let store = SceneStore::new(tmp.path()).unwrap();

        let videogen = Arc::new(videogen);
        let speech = Arc::new(FakeSpeech::new());
        let lipsync = Arc::new(lipsync);
        let transcoder = Arc::new(FakeTranscoder::new());

        let orchestrator = Orchestrator::new(
            store.clone(),
            videogen.clone(),
            with_dialogue.then(|| speech.clone() as Arc<dyn SpeechClient>),
            with_dialogue.then(|| lipsync.clone() as Arc<dyn LipSyncClient>),
            transcoder.clone(),
            fast_settings(),
        );

        Self {
            tmp,
            store,
            videogen,
            speech,
            lipsync,
            transcoder,
            orchestrator,
        }
    }
}

pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        poll: PollPolicy::new(Duration::from_millis(1), Duration::from_millis(50)),
        prores_profile: 2,
    }
}

pub fn scene(id: &str, dialogue: Option<&str>, skip_lipsync: bool) -> SceneConfig {
    SceneConfig {
        scene_id: id.into(),
        prompt: VideoPrompt {
            cinematic_description: "A woman walks through a city".into(),
            dialogue_text: dialogue.map(str::to_string),
            ..Default::default()
        },
        voice_id: None,
        input_video: None,
        skip_lipsync,
    }
}
