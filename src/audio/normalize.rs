//! Output level normalization applied before writing the artifact

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::clip::{rms, AudioClip};
use crate::error::{GenwaveError, Result};

/// Target RMS for the loudness strategy (-14 dBFS)
pub const LOUDNESS_TARGET_DB: f32 = -14.0;

/// Peak ceiling for the peak strategy (-0.1 dBFS)
pub const PEAK_CEILING: f32 = 0.988_553;

/// Silence threshold below which no gain is applied
const SILENCE_RMS: f32 = 1e-6;

/// Cap on make-up gain so near-silent output is not blown up (+40 dB)
const MAX_GAIN: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeStrategy {
    /// RMS to -14 dBFS followed by a soft tanh compressor
    #[default]
    Loudness,
    /// Scale so the loudest sample sits just under full scale
    Peak,
    /// Hard clip to [-1, 1], no gain change
    Clip,
}

impl NormalizeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loudness => "loudness",
            Self::Peak => "peak",
            Self::Clip => "clip",
        }
    }

    pub fn apply(&self, clip: &mut AudioClip) {
        match self {
            Self::Loudness => loudness(&mut clip.samples),
            Self::Peak => peak(&mut clip.samples),
            Self::Clip => hard_clip(&mut clip.samples),
        }
    }
}

impl FromStr for NormalizeStrategy {
    type Err = GenwaveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "loudness" => Ok(Self::Loudness),
            "peak" => Ok(Self::Peak),
            "clip" => Ok(Self::Clip),
            other => Err(GenwaveError::invalid(
                "normalize",
                format!("expected loudness, peak or clip, got '{other}'"),
            )),
        }
    }
}

impl std::fmt::Display for NormalizeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

fn loudness(samples: &mut [f32]) {
    let current = rms(samples);
    if current < SILENCE_RMS {
        return;
    }
    let gain = (db_to_linear(LOUDNESS_TARGET_DB) / current).min(MAX_GAIN);
    for s in samples.iter_mut() {
        *s = (*s * gain).tanh();
    }
}

fn peak(samples: &mut [f32]) {
    let max = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if max < SILENCE_RMS {
        return;
    }
    let gain = PEAK_CEILING / max;
    for s in samples.iter_mut() {
        *s *= gain;
    }
}

fn hard_clip(samples: &mut [f32]) {
    for s in samples.iter_mut() {
        *s = s.clamp(-1.0, 1.0);
    }
}
