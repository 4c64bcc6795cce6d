//! Deterministic tone generator
//!
//! Does no model inference. Synthesizes a short chord whose pitch is derived
//! from the prompt, at the checkpoint's native rate and the requested
//! duration. Used by the simple-test command and for offline runs.

use std::f32::consts::PI;
use std::time::Instant;

use crate::audio::AudioClip;
use crate::error::{GenwaveError, Result};
use crate::generation::model::{AudioGenerator, GenerationResult, GenerationSpec, GeneratorInfo};

/// Ratios of a major triad
const CHORD: [f32; 3] = [1.0, 1.259_921, 1.498_307];

pub struct ToneGenerator {
    info: GeneratorInfo,
    channels: u16,
}

impl ToneGenerator {
    pub fn new() -> Self {
        Self {
            info: GeneratorInfo {
                id: "tone".to_string(),
                name: "Tone generator".to_string(),
                description: "Synthesizes a prompt-keyed chord without model inference"
                    .to_string(),
                deterministic: true,
            },
            channels: 1,
        }
    }

    /// Emit interleaved multi-channel output (same signal on every channel)
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels.max(1);
        self
    }

    /// Root frequency in 110..440 Hz picked from the prompt text
    pub fn root_frequency(prompt: &str) -> f32 {
        // FNV-1a
        let hash = prompt
            .trim()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
                (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
            });
        110.0 * 2.0f32.powf((hash % 24) as f32 / 12.0)
    }
}

impl Default for ToneGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGenerator for ToneGenerator {
    fn info(&self) -> &GeneratorInfo {
        &self.info
    }

    fn generate(&self, spec: &GenerationSpec<'_>) -> Result<GenerationResult> {
        let start = Instant::now();

        if spec.prompt.trim().is_empty() {
            return Err(GenwaveError::generation("empty prompt"));
        }

        let sample_rate = spec.variant.sample_rate();
        let frames = (spec.duration_secs as usize) * sample_rate as usize;
        let root = Self::root_frequency(spec.prompt);
        // A melody reference shifts the chord by the reference's loudness so
        // conditioning is observable in tests.
        let shift = spec.melody.map(|m| 1.0 + m.rms()).unwrap_or(1.0);
        let fade = (sample_rate as usize / 100).max(1);

        let mut samples = Vec::with_capacity(frames * self.channels as usize);
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let mut value: f32 = CHORD
                .iter()
                .map(|ratio| (2.0 * PI * root * ratio * shift * t).sin())
                .sum::<f32>()
                / CHORD.len() as f32;
            // 10ms fades keep the edges click-free
            let edge = i.min(frames - 1 - i);
            if edge < fade {
                value *= edge as f32 / fade as f32;
            }
            let value = 0.5 * value;
            for _ in 0..self.channels {
                samples.push(value);
            }
        }

        tracing::debug!(root, frames, "synthesized tone");

        Ok(GenerationResult::new(
            AudioClip::new(samples, sample_rate, self.channels),
            start.elapsed().as_millis() as u64,
        ))
    }
}
