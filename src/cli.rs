use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sceneloom")]
#[command(author, version, about = "Prompt-to-mezzanine video production pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a single scene with optional dialogue and lip-sync
    Generate {
        /// Scene identifier (e.g. scene_01)
        #[arg(long)]
        scene_id: String,

        /// Cinematic description of the shot
        #[arg(long)]
        prompt: String,

        /// Character consistency notes
        #[arg(long)]
        character: Option<String>,

        /// Camera movement and framing
        #[arg(long)]
        camera: Option<String>,

        /// Lighting and visual style
        #[arg(long)]
        lighting: Option<String>,

        /// Emotion and facial performance
        #[arg(long)]
        emotion: Option<String>,

        /// Dialogue text; enables speech synthesis and lip-sync
        #[arg(long)]
        dialogue: Option<String>,

        /// Voice ID override for speech synthesis
        #[arg(long)]
        voice_id: Option<String>,

        /// Extend this video (path or URI) instead of generating fresh
        #[arg(long)]
        input_video: Option<String>,

        /// Keep dialogue audio but skip the lip-sync stage
        #[arg(long)]
        skip_lipsync: bool,

        /// Project root directory (overrides config)
        #[arg(long)]
        project_root: Option<PathBuf>,
    },

    /// Process multiple scenes from a batch file
    Batch {
        /// JSON file with scene definitions
        #[arg(required = true)]
        file: PathBuf,

        /// Voice ID applied to scenes that do not set one
        #[arg(long)]
        voice_id: Option<String>,

        /// Skip the lip-sync stage for every scene
        #[arg(long)]
        skip_lipsync: bool,

        /// Project root directory (overrides config)
        #[arg(long)]
        project_root: Option<PathBuf>,
    },

    /// Show the status of every known scene
    Status {
        /// Project root directory (overrides config)
        #[arg(long)]
        project_root: Option<PathBuf>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Display version information
    Version,
}
