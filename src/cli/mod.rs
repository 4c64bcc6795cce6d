//! CLI Module
//!
//! Command-line interface for the generation pipeline and its self checks.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::audio::NormalizeStrategy;
use crate::config::{
    GeneratorBackend, ENV_BRIDGE_URL, ENV_GENERATOR, ENV_LOCAL_BUCKET_DIR, ENV_WORK_DIR,
};
use crate::generation::{ModelSize, DEFAULT_MUSIC_DURATION_SECS, DEFAULT_SFX_DURATION_SECS};

/// Genwave - text-to-audio generation with durable artifacts
#[derive(Parser, Debug)]
#[command(name = "genwave")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Embed the WAV file as base64 in the JSON payload
    #[arg(long, global = true)]
    pub include_audio: bool,

    /// Output normalization
    #[arg(long, global = true, default_value_t = NormalizeStrategy::Loudness)]
    pub normalize: NormalizeStrategy,

    /// Generator backend (bridge or tone)
    #[arg(long, global = true, env = ENV_GENERATOR)]
    pub generator: Option<GeneratorBackend>,

    /// Model runtime base URL
    #[arg(long, global = true, env = ENV_BRIDGE_URL)]
    pub bridge_url: Option<String>,

    /// Directory for temporary WAV files
    #[arg(long, global = true, env = ENV_WORK_DIR)]
    pub work_dir: Option<PathBuf>,

    /// Store artifacts in this directory instead of S3
    #[arg(long, global = true, env = ENV_LOCAL_BUCKET_DIR)]
    pub local_bucket_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate music from a text prompt
    #[command(name = "generate-music")]
    GenerateMusic {
        /// Text description of the music
        #[arg(short, long)]
        prompt: String,

        /// Length in seconds (1-300)
        #[arg(short, long, default_value_t = DEFAULT_MUSIC_DURATION_SECS)]
        duration: u32,

        /// Model size: small, medium, large or melody
        #[arg(short, long, default_value_t = ModelSize::Large)]
        model_size: ModelSize,

        /// WAV file whose melody conditions generation
        #[arg(long)]
        melody: Option<PathBuf>,

        /// Run or deduplication id scoping the artifact key
        #[arg(long)]
        message_id: Option<String>,
    },

    /// Generate a sound effect from a text prompt
    #[command(name = "generate-sfx")]
    GenerateSfx {
        /// Text description of the sound
        #[arg(short, long)]
        prompt: String,

        /// Length in seconds (1-300)
        #[arg(short, long, default_value_t = DEFAULT_SFX_DURATION_SECS)]
        duration: u32,

        /// Run or deduplication id scoping the artifact key
        #[arg(long)]
        message_id: Option<String>,
    },

    /// Report service liveness
    #[command(name = "health-check")]
    HealthCheck,

    /// Encode a synthetic tone end to end without uploading
    #[command(name = "simple-test")]
    SimpleTest,
}
