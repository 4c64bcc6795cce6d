//! CLI Command Implementations
//!
//! Each command writes exactly one JSON payload to the given output.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{Cli, Commands};
use crate::config::RuntimeSettings;
use crate::error::{GenwaveError, Result};
use crate::generation::{GenerationRequest, MelodyPrompt, ModelSize};
use crate::publisher::PublishOptions;
use crate::service::{self, ErrorReport, GenerationService};

/// Environment settings with command-line overrides applied
pub fn runtime_settings(cli: &Cli) -> Result<RuntimeSettings> {
    let mut settings = RuntimeSettings::from_env()?;
    if let Some(generator) = cli.generator {
        settings.generator = generator;
    }
    if let Some(url) = &cli.bridge_url {
        settings.bridge_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = &cli.work_dir {
        settings.work_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.local_bucket_dir {
        settings.local_bucket_dir = Some(dir.clone());
    }
    Ok(settings)
}

fn publish_options(cli: &Cli, settings: &RuntimeSettings) -> PublishOptions {
    PublishOptions {
        normalize: cli.normalize,
        include_audio: cli.include_audio,
        work_dir: settings.work_dir.clone(),
    }
}

/// Run the parsed command, writing its payload to `out`.
///
/// On failure the `{success: false, error_code, kind, error}` payload is
/// written instead and the error is returned so the caller can exit
/// non-zero.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let outcome = match &cli.command {
        Commands::GenerateMusic {
            prompt,
            duration,
            model_size,
            melody,
            message_id,
        } => generate_music(
            cli,
            out,
            prompt,
            *duration,
            *model_size,
            melody.as_ref(),
            message_id.as_deref(),
        ),
        Commands::GenerateSfx {
            prompt,
            duration,
            message_id,
        } => generate_sfx(cli, out, prompt, *duration, message_id.as_deref()),
        Commands::HealthCheck => health_check(out),
        Commands::SimpleTest => simple_test(cli, out),
    };

    if let Err(e) = &outcome {
        write_error(out, e)?;
    }
    outcome
}

/// Serialize `payload` as pretty JSON followed by a newline
pub fn write_json<W: Write, T: Serialize>(out: &mut W, payload: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, payload)?;
    writeln!(out)?;
    Ok(())
}

/// Write the failure payload for `err`
pub fn write_error<W: Write>(out: &mut W, err: &GenwaveError) -> Result<()> {
    write_json(out, &ErrorReport::from(err))
}

fn run_generation<W: Write>(cli: &Cli, out: &mut W, request: GenerationRequest) -> Result<()> {
    let settings = runtime_settings(cli)?;
    let options = publish_options(cli, &settings);
    let service = GenerationService::from_settings(settings).with_options(options);

    let generator = service.generator();
    let backend = generator.info();
    info!(
        backend = %backend.id,
        name = %backend.name,
        deterministic = backend.deterministic,
        "{}",
        backend.description
    );
    if !generator.is_available() {
        warn!(backend = %backend.id, "generator backend did not pass its health check");
    }

    let report = service.generate(&request)?;
    info!(uri = %report.s3_uri, "generation complete");
    write_json(out, &report)
}

/// Generate music and publish the WAV artifact.
pub fn generate_music<W: Write>(
    cli: &Cli,
    out: &mut W,
    prompt: &str,
    duration: u32,
    model_size: ModelSize,
    melody: Option<&PathBuf>,
    message_id: Option<&str>,
) -> Result<()> {
    let mut request = GenerationRequest::music(prompt)
        .with_duration(duration)
        .with_model_size(model_size);
    if let Some(path) = melody {
        request = request.with_melody(MelodyPrompt::new(path.clone()));
    }
    if let Some(id) = message_id {
        request = request.with_message_id(id);
    }
    run_generation(cli, out, request)
}

/// Generate a sound effect and publish the WAV artifact.
pub fn generate_sfx<W: Write>(
    cli: &Cli,
    out: &mut W,
    prompt: &str,
    duration: u32,
    message_id: Option<&str>,
) -> Result<()> {
    let mut request = GenerationRequest::sound_effect(prompt).with_duration(duration);
    if let Some(id) = message_id {
        request = request.with_message_id(id);
    }
    run_generation(cli, out, request)
}

pub fn health_check<W: Write>(out: &mut W) -> Result<()> {
    write_json(out, &service::health_check())
}

pub fn simple_test<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let settings = runtime_settings(cli)?;
    let report = service::simple_test(&publish_options(cli, &settings))?;
    write_json(out, &report)
}
