mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

use sceneloom::batch::{self, BatchOverrides};
use sceneloom::config::{self, Config};
use sceneloom::pipeline::{Orchestrator, SceneOutcome};
use sceneloom::prompt::{SceneConfig, VideoPrompt};
use sceneloom::store::SceneStore;
use sceneloom::transcode;

fn main() {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive the filter from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "sceneloom=trace".to_string()
        } else {
            "sceneloom=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Generate {
            scene_id,
            prompt,
            character,
            camera,
            lighting,
            emotion,
            dialogue,
            voice_id,
            input_video,
            skip_lipsync,
            project_root,
        } => {
            let config = load_config(cli.config.as_deref(), project_root)?;
            let scene = SceneConfig {
                scene_id,
                prompt: VideoPrompt {
                    cinematic_description: prompt,
                    character_consistency: character,
                    camera_movement: camera,
                    lighting_style: lighting,
                    emotion_performance: emotion,
                    dialogue_text: dialogue,
                },
                voice_id,
                input_video,
                skip_lipsync,
            };

            let orchestrator = Orchestrator::from_config(&config)?;
            let rt = tokio::runtime::Runtime::new()?;
            let outcome = rt.block_on(orchestrator.run_scene(&scene));

            print_outcome(&outcome);
            Ok(if outcome.is_success() { 0 } else { 1 })
        }

        Commands::Batch {
            file,
            voice_id,
            skip_lipsync,
            project_root,
        } => {
            let config = load_config(cli.config.as_deref(), project_root)?;
            let scenes = batch::load_batch_file(&file)?;
            println!("Processing {} scenes...", scenes.len());

            let overrides = BatchOverrides {
                voice_id,
                skip_lipsync,
            };
            let orchestrator = Orchestrator::from_config(&config)?;
            let rt = tokio::runtime::Runtime::new()?;
            let outcomes = rt.block_on(batch::run_batch(&orchestrator, scenes, &overrides));

            print_batch_summary(&outcomes);
            let failures = outcomes.iter().filter(|o| !o.is_success()).count();
            // Exit 2 signals partial failure so callers can tell it apart
            // from a hard configuration error.
            Ok(if failures == 0 { 0 } else { 2 })
        }

        Commands::Status { project_root } => {
            let config = load_config(cli.config.as_deref(), project_root)?;
            report_status(&config)
        }

        Commands::CheckTools => check_tools(cli.config.as_deref()),

        Commands::Version => {
            println!("sceneloom {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

fn load_config(
    config_path: Option<&std::path::Path>,
    project_root: Option<PathBuf>,
) -> Result<Config> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(root) = project_root {
        config.project_root = root;
    }
    Ok(config)
}

fn print_outcome(outcome: &SceneOutcome) {
    if outcome.is_success() {
        println!("\nScene {} completed", outcome.scene_id);
        for (stage, path) in &outcome.artifacts {
            println!("  {stage:<20} {}", path.display());
        }
        if let Some(final_path) = outcome.final_artifact() {
            println!("\nFinal mezzanine: {}", final_path.display());
        }
    } else if let Some(failure) = &outcome.failure {
        println!(
            "\nScene {} FAILED at {} [{}]",
            outcome.scene_id,
            failure.stage_name(),
            failure.kind
        );
        println!("  {}", failure.message);
        if !outcome.artifacts.is_empty() {
            println!("  Artifacts kept for resume:");
            for (stage, path) in &outcome.artifacts {
                println!("    {stage:<20} {}", path.display());
            }
        }
    }
}

fn print_batch_summary(outcomes: &[SceneOutcome]) {
    println!("\nBatch summary:");
    for outcome in outcomes {
        match &outcome.failure {
            None => {
                let final_path = outcome
                    .final_artifact()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!("  {:<20} ok       {final_path}", outcome.scene_id);
            }
            Some(failure) => {
                println!(
                    "  {:<20} FAILED   {} [{}]: {}",
                    outcome.scene_id,
                    failure.stage_name(),
                    failure.kind,
                    failure.message
                );
            }
        }
    }

    let ok = outcomes.iter().filter(|o| o.is_success()).count();
    println!("\n{ok}/{} scenes completed", outcomes.len());
}

fn report_status(config: &Config) -> Result<i32> {
    let store = SceneStore::new(&config.project_root)?;
    let mut scenes = store.list_scenes()?;
    scenes.sort();

    if scenes.is_empty() {
        println!("No scenes found under {}", config.project_root.display());
        return Ok(0);
    }

    for scene_id in scenes {
        match store.read_record(&scene_id) {
            Ok(Some(record)) => {
                let artifacts: Vec<String> =
                    record.artifacts.keys().map(|s| s.to_string()).collect();
                print!("{scene_id:<20} {:<24}", record.status.to_string());
                if let Some(err) = &record.last_error {
                    print!(" [{}: {}]", err.stage_name(), err.kind);
                }
                println!(" {}", artifacts.join(", "));
            }
            Ok(None) => println!("{scene_id:<20} (no record)"),
            Err(e) => println!("{scene_id:<20} (corrupt metadata: {e})"),
        }
    }

    Ok(0)
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<i32> {
    let config = config::load_config_or_default(config_path)?;
    let tools = transcode::check_tools(&config.transcode);
    let mut all_ok = true;

    for tool in &tools {
        match &tool.path {
            Some(path) => println!("✓ {} - {}", tool.name, path.display()),
            None => {
                all_ok = false;
                println!("✗ {} - not found", tool.name);
            }
        }
    }

    if all_ok {
        println!("\nAll required tools are available!");
        Ok(0)
    } else {
        println!("\nSome tools are missing. Install them to enable transcoding.");
        Ok(1)
    }
}
