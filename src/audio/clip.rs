//! In-memory audio clip

use serde::{Deserialize, Serialize};

/// Interleaved 32-bit float samples in [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Check the clip is something a WAV file can hold
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.channels == 0 {
            return Err("clip has zero channels".to_string());
        }
        if self.sample_rate == 0 {
            return Err("clip has zero sample rate".to_string());
        }
        if self.samples.is_empty() {
            return Err("clip contains no samples".to_string());
        }
        if self.samples.len() % self.channels as usize != 0 {
            return Err(format!(
                "{} samples do not divide into {} channels",
                self.samples.len(),
                self.channels
            ));
        }
        if let Some(i) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(format!("sample {i} is not finite"));
        }
        Ok(())
    }

    /// Average all channels into one
    pub fn to_mono(&self) -> AudioClip {
        if self.channels <= 1 {
            return self.clone();
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        AudioClip::mono(samples, self.sample_rate)
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }
}

pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}
