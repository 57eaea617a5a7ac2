//! End-to-end pipeline scenarios against fake providers.

mod common;

use common::{scene, FakeVideoGen, Harness};
use sceneloom::store::{SceneStatus, Stage};

#[tokio::test]
async fn scenario_a_no_dialogue_uses_only_videogen_and_transcoder() {
    let h = Harness::new();
    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", None, false))
        .await;

    assert!(outcome.is_success(), "failure: {:?}", outcome.failure);
    assert_eq!(h.videogen.submit_count(), 1);
    assert_eq!(h.speech.call_count(), 0);
    assert_eq!(h.lipsync.submit_count(), 0);

    // raw + mezzanine + final, no audio artifact recorded
    assert!(outcome.artifacts.contains_key(&Stage::RawVideo));
    assert!(outcome.artifacts.contains_key(&Stage::MezzanineVideo));
    assert!(outcome.artifacts.contains_key(&Stage::FinalVideo));
    assert!(!outcome.artifacts.contains_key(&Stage::DialogueAudio));
    assert!(!outcome.artifacts.contains_key(&Stage::SyncedVideo));

    let final_path = outcome.final_artifact().unwrap();
    assert!(final_path.exists());

    let record = h.store.read_record("scene_01").unwrap().unwrap();
    assert_eq!(record.status, SceneStatus::Completed);
    assert!(record.last_error.is_none());
}

#[tokio::test]
async fn scenario_b_dialogue_runs_speech_and_lipsync_once_each() {
    let h = Harness::new();
    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", Some("Hello world"), false))
        .await;

    assert!(outcome.is_success(), "failure: {:?}", outcome.failure);
    assert_eq!(h.speech.call_count(), 1);
    assert_eq!(h.lipsync.submit_count(), 1);

    assert!(outcome.artifacts.contains_key(&Stage::DialogueAudio));
    assert!(outcome.artifacts.contains_key(&Stage::SyncedVideo));

    // The final conversion consumed the synced video, not the mezzanine.
    let synced = outcome.artifacts.get(&Stage::SyncedVideo).unwrap();
    assert_eq!(h.transcoder.last_input().as_ref(), Some(synced));
}

#[tokio::test]
async fn scenario_c_skip_lipsync_keeps_audio_but_not_synced_video() {
    let h = Harness::new();
    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", Some("Hello world"), true))
        .await;

    assert!(outcome.is_success(), "failure: {:?}", outcome.failure);
    assert_eq!(h.speech.call_count(), 1);
    assert_eq!(h.lipsync.submit_count(), 0);

    assert!(outcome.artifacts.contains_key(&Stage::DialogueAudio));
    assert!(!outcome.artifacts.contains_key(&Stage::SyncedVideo));

    // The final conversion consumed the mezzanine video.
    let mezzanine = outcome.artifacts.get(&Stage::MezzanineVideo).unwrap();
    assert_eq!(h.transcoder.last_input().as_ref(), Some(mezzanine));
}

#[tokio::test]
async fn scenario_d_remote_failure_stops_the_scene() {
    let h = Harness::with_videogen(FakeVideoGen::failing("content_policy"));
    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", Some("Hello world"), false))
        .await;

    assert_eq!(outcome.status, SceneStatus::Failed);
    let failure = outcome.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Some(Stage::RawVideo));
    assert!(failure.message.contains("content_policy"));

    // No further stages attempted.
    assert_eq!(h.speech.call_count(), 0);
    assert_eq!(h.transcoder.convert_count(), 0);

    // The failure is persisted.
    let record = h.store.read_record("scene_01").unwrap().unwrap();
    assert_eq!(record.status, SceneStatus::Failed);
    let last = record.last_error.unwrap();
    assert_eq!(last.stage, Some(Stage::RawVideo));
    assert!(last.message.contains("content_policy"));
}

#[tokio::test]
async fn poll_budget_exhaustion_fails_with_timeout() {
    let h = Harness::with_videogen(FakeVideoGen::pending_forever());
    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", None, false))
        .await;

    assert_eq!(outcome.status, SceneStatus::Failed);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.kind, "timeout");
    assert_eq!(failure.stage, Some(Stage::RawVideo));
}

#[tokio::test]
async fn second_run_reuses_existing_artifacts() {
    let h = Harness::new();
    let config = scene("scene_01", Some("Hello world"), false);

    let first = h.orchestrator.run_scene(&config).await;
    assert!(first.is_success());
    assert_eq!(h.videogen.submit_count(), 1);
    assert_eq!(h.speech.call_count(), 1);
    assert_eq!(h.lipsync.submit_count(), 1);
    assert_eq!(h.transcoder.convert_count(), 2);

    let second = h.orchestrator.run_scene(&config).await;
    assert!(second.is_success());

    // No remote or tool call ran again.
    assert_eq!(h.videogen.submit_count(), 1);
    assert_eq!(h.speech.call_count(), 1);
    assert_eq!(h.lipsync.submit_count(), 1);
    assert_eq!(h.transcoder.convert_count(), 2);
    assert_eq!(first.artifacts, second.artifacts);
}

#[tokio::test]
async fn missing_artifact_is_regenerated_despite_completed_status() {
    let h = Harness::new();
    let config = scene("scene_01", None, false);

    let first = h.orchestrator.run_scene(&config).await;
    assert!(first.is_success());

    // Someone deleted the raw video; status still says completed.
    std::fs::remove_file(h.store.artifact_path("scene_01", Stage::RawVideo)).unwrap();

    let second = h.orchestrator.run_scene(&config).await;
    assert!(second.is_success());
    assert_eq!(h.videogen.submit_count(), 2);
    // Downstream artifacts were still on disk and reused.
    assert_eq!(h.transcoder.convert_count(), 2);
}

#[tokio::test]
async fn validation_failure_precedes_all_remote_calls() {
    let h = Harness::new();
    let mut config = scene("scene_01", None, false);
    config.prompt.cinematic_description = "   ".into();

    let outcome = h.orchestrator.run_scene(&config).await;
    assert_eq!(outcome.status, SceneStatus::Failed);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.kind, "validation");
    assert_eq!(failure.stage, None);
    assert_eq!(h.videogen.submit_count(), 0);
}

#[tokio::test]
async fn unsafe_scene_id_creates_no_directory() {
    let h = Harness::new();
    let config = scene("../escape", None, false);

    let outcome = h.orchestrator.run_scene(&config).await;
    assert_eq!(outcome.failure.unwrap().kind, "validation");
    assert!(!h.tmp.path().join("scenes").join("../escape").exists());
}

#[tokio::test]
async fn dialogue_without_speech_provider_is_config_failure() {
    let h = Harness::without_dialogue_providers();
    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", Some("Hello"), false))
        .await;

    assert_eq!(outcome.status, SceneStatus::Failed);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.kind, "config");
    // Detected before any remote call.
    assert_eq!(h.videogen.submit_count(), 0);
}

#[tokio::test]
async fn no_dialogue_works_without_speech_provider() {
    let h = Harness::without_dialogue_providers();
    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", None, false))
        .await;
    assert!(outcome.is_success(), "failure: {:?}", outcome.failure);
}

#[tokio::test]
async fn truncated_artifact_is_a_storage_failure() {
    let h = Harness::new();
    let dir = h.store.create_scene("scene_01").unwrap();
    std::fs::write(dir.join("scene_01_raw.mp4"), b"").unwrap();

    let outcome = h
        .orchestrator
        .run_scene(&scene("scene_01", None, false))
        .await;

    assert_eq!(outcome.status, SceneStatus::Failed);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.kind, "storage");
    assert_eq!(failure.stage, Some(Stage::RawVideo));
    assert_eq!(h.videogen.submit_count(), 0);
}
