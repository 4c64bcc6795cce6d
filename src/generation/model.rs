//! Generator trait and core types
//!
//! Defines the capability every inference backend provides.

use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::error::Result;
use crate::generation::request::ModelVariant;

/// Everything a backend needs for one generation
#[derive(Debug, Clone)]
pub struct GenerationSpec<'a> {
    pub prompt: &'a str,
    pub duration_secs: u32,
    pub variant: ModelVariant,
    /// Decoded melody reference, only for the melody checkpoint
    pub melody: Option<&'a AudioClip>,
    /// Token for gated model downloads
    pub auth_token: Option<&'a str>,
}

/// Raw output of a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub audio: AudioClip,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl GenerationResult {
    pub fn new(audio: AudioClip, processing_time_ms: u64) -> Self {
        Self {
            audio,
            processing_time_ms,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }
}

/// Information about a generator backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorInfo {
    /// Backend identifier (e.g., "bridge", "tone")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Description of what the backend does
    pub description: String,

    /// Whether output depends only on the inputs
    pub deterministic: bool,
}

/// Trait that all generator backends implement
pub trait AudioGenerator: Send + Sync {
    /// Get backend information
    fn info(&self) -> &GeneratorInfo;

    /// Run one generation
    ///
    /// Blocks until the backend returns. Failures surface as
    /// `GenwaveError::Generation` (or the runtime variants) carrying the
    /// backend's message unchanged.
    fn generate(&self, spec: &GenerationSpec<'_>) -> Result<GenerationResult>;

    /// Check if the backend is ready to use
    fn is_available(&self) -> bool {
        true
    }

    /// Get backend ID (convenience method)
    fn id(&self) -> &str {
        &self.info().id
    }
}
