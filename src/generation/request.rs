//! Generation requests and model variant selection

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GenwaveError, Result};

pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 300;

pub const DEFAULT_MUSIC_DURATION_SECS: u32 = 30;
pub const DEFAULT_SFX_DURATION_SECS: u32 = 60;

const MAX_MESSAGE_ID_LEN: usize = 128;

/// Requested model size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Small,
    Medium,
    Large,
    Melody,
}

impl ModelSize {
    pub const ALL: [ModelSize; 4] = [Self::Small, Self::Medium, Self::Large, Self::Melody];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Melody => "melody",
        }
    }
}

impl FromStr for ModelSize {
    type Err = GenwaveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "melody" => Ok(Self::Melody),
            other => Err(GenwaveError::invalid(
                "model_size",
                format!("'{other}' is not one of small, medium, large, melody"),
            )),
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which model family serves the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// MusicGen
    Music,
    /// AudioGen
    SoundEffects,
}

/// A concrete pretrained checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelVariant {
    MusicgenSmall,
    MusicgenMedium,
    MusicgenLarge,
    MusicgenMelody,
    AudiogenMedium,
}

impl ModelVariant {
    pub fn select(kind: GeneratorKind, size: ModelSize) -> Result<Self> {
        match (kind, size) {
            (GeneratorKind::Music, ModelSize::Small) => Ok(Self::MusicgenSmall),
            (GeneratorKind::Music, ModelSize::Medium) => Ok(Self::MusicgenMedium),
            (GeneratorKind::Music, ModelSize::Large) => Ok(Self::MusicgenLarge),
            (GeneratorKind::Music, ModelSize::Melody) => Ok(Self::MusicgenMelody),
            (GeneratorKind::SoundEffects, ModelSize::Medium) => Ok(Self::AudiogenMedium),
            (GeneratorKind::SoundEffects, other) => Err(GenwaveError::invalid(
                "model_size",
                format!("sound effects are only available in medium, got '{other}'"),
            )),
        }
    }

    /// Short name, e.g. `musicgen-large`
    pub fn name(&self) -> &'static str {
        match self {
            Self::MusicgenSmall => "musicgen-small",
            Self::MusicgenMedium => "musicgen-medium",
            Self::MusicgenLarge => "musicgen-large",
            Self::MusicgenMelody => "musicgen-melody",
            Self::AudiogenMedium => "audiogen-medium",
        }
    }

    /// Hub id the runtime loads weights from
    pub fn pretrained_id(&self) -> String {
        format!("facebook/{}", self.name())
    }

    /// Model family, also the object key prefix
    pub fn family(&self) -> &'static str {
        match self {
            Self::AudiogenMedium => "audiogen",
            _ => "musicgen",
        }
    }

    /// Name used in artifact file names
    pub fn generator_name(&self) -> &'static str {
        match self {
            Self::MusicgenMelody => "musicgen_melody",
            Self::AudiogenMedium => "audiogen",
            _ => "musicgen",
        }
    }

    pub fn size(&self) -> ModelSize {
        match self {
            Self::MusicgenSmall => ModelSize::Small,
            Self::MusicgenMedium | Self::AudiogenMedium => ModelSize::Medium,
            Self::MusicgenLarge => ModelSize::Large,
            Self::MusicgenMelody => ModelSize::Melody,
        }
    }

    pub fn supports_melody(&self) -> bool {
        matches!(self, Self::MusicgenMelody)
    }

    /// Native output rate of the checkpoint
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::AudiogenMedium => 16_000,
            _ => 32_000,
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference audio whose melody conditions generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MelodyPrompt {
    pub path: PathBuf,
}

impl MelodyPrompt {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// One generation invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub melody_prompt: Option<MelodyPrompt>,
    pub duration_secs: u32,
    pub model_size: ModelSize,
    pub kind: GeneratorKind,
    /// Caller-supplied run or deduplication id, scopes the object key
    pub message_id: Option<String>,
}

impl GenerationRequest {
    /// Music request with the default size (large) and duration (30s)
    pub fn music(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            melody_prompt: None,
            duration_secs: DEFAULT_MUSIC_DURATION_SECS,
            model_size: ModelSize::Large,
            kind: GeneratorKind::Music,
            message_id: None,
        }
    }

    /// Sound-effect request with the default duration (60s)
    pub fn sound_effect(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            melody_prompt: None,
            duration_secs: DEFAULT_SFX_DURATION_SECS,
            model_size: ModelSize::Medium,
            kind: GeneratorKind::SoundEffects,
            message_id: None,
        }
    }

    pub fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_model_size(mut self, model_size: ModelSize) -> Self {
        self.model_size = model_size;
        self
    }

    pub fn with_melody(mut self, melody: MelodyPrompt) -> Self {
        self.melody_prompt = Some(melody);
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Check parameter bounds and resolve the model variant.
    ///
    /// `melody` without a melody prompt is accepted and generates from the
    /// text alone on the melody checkpoint.
    pub fn validate(&self) -> Result<ModelVariant> {
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(GenwaveError::invalid(
                "duration",
                format!(
                    "must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds, got {}",
                    self.duration_secs
                ),
            ));
        }

        if self.prompt.trim().is_empty() {
            return Err(GenwaveError::invalid("prompt", "cannot be empty"));
        }

        if let Some(id) = &self.message_id {
            validate_message_id(id)?;
        }

        let variant = ModelVariant::select(self.kind, self.model_size)?;

        if self.melody_prompt.is_some() && !variant.supports_melody() {
            return Err(GenwaveError::invalid(
                "melody_prompt",
                format!("{variant} cannot take a melody reference, use model size 'melody'"),
            ));
        }

        Ok(variant)
    }
}

/// Ids become part of the object key, so only key-safe characters pass.
fn validate_message_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_MESSAGE_ID_LEN {
        return Err(GenwaveError::invalid(
            "message_id",
            format!("must be 1 to {MAX_MESSAGE_ID_LEN} characters"),
        ));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(GenwaveError::invalid(
            "message_id",
            format!("character '{bad}' is not allowed, use letters, digits, '-', '_' or '.'"),
        ));
    }
    Ok(())
}
