//! Inference invocation
//!
//! Turns a validated request into one call on a generator backend.

use crate::audio::read_wav;
use crate::error::{GenwaveError, Result};
use crate::generation::model::{AudioGenerator, GenerationResult, GenerationSpec};
use crate::generation::request::{GenerationRequest, ModelVariant};

const PROMPT_LOG_CHARS: usize = 100;

fn prompt_preview(prompt: &str) -> String {
    let mut preview: String = prompt.chars().take(PROMPT_LOG_CHARS).collect();
    if prompt.chars().count() > PROMPT_LOG_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Run `request` on `generator`. `variant` must come from
/// `request.validate()`.
pub fn invoke(
    generator: &dyn AudioGenerator,
    request: &GenerationRequest,
    variant: ModelVariant,
    auth_token: Option<&str>,
) -> Result<GenerationResult> {
    let melody = match &request.melody_prompt {
        Some(melody) => {
            let clip = read_wav(&melody.path).map_err(|e| {
                GenwaveError::invalid(
                    "melody_prompt",
                    format!("cannot load {}: {}", melody.path.display(), e),
                )
            })?;
            if clip.is_empty() {
                return Err(GenwaveError::invalid(
                    "melody_prompt",
                    format!("{} contains no audio", melody.path.display()),
                ));
            }
            tracing::info!(path = %melody.path.display(), "loaded reference melody");
            Some(clip)
        }
        None => {
            if variant.supports_melody() {
                tracing::warn!("melody model requested without a reference, generating from text only");
            }
            None
        }
    };

    let spec = GenerationSpec {
        prompt: request.prompt.trim(),
        duration_secs: request.duration_secs,
        variant,
        melody: melody.as_ref(),
        auth_token,
    };

    tracing::info!(
        backend = generator.id(),
        model = %variant,
        duration_secs = request.duration_secs,
        prompt = %prompt_preview(&request.prompt),
        "generating audio"
    );

    let result = generator.generate(&spec)?;
    if result.audio.is_empty() {
        return Err(GenwaveError::generation("generator produced no output"));
    }

    tracing::info!(
        sample_rate = result.sample_rate(),
        seconds = result.audio.duration_secs(),
        elapsed_ms = result.processing_time_ms,
        "audio generated"
    );
    Ok(result)
}
