//! WAV encoding and decoding
//!
//! Artifacts are written as 16-bit PCM, the format the generation runtime
//! itself produces. Melody references may be any PCM or float WAV.

use std::io::{Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::audio::clip::AudioClip;
use crate::error::{GenwaveError, Result};

/// Bit depth of written artifacts
pub const ARTIFACT_BITS_PER_SAMPLE: u16 = 16;

fn artifact_spec(clip: &AudioClip) -> WavSpec {
    WavSpec {
        channels: clip.channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: ARTIFACT_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Encode a clip as 16-bit PCM WAV into any seekable writer
pub fn encode_wav<W: Write + Seek>(clip: &AudioClip, writer: W) -> Result<()> {
    clip.check()
        .map_err(|reason| GenwaveError::generation(format!("cannot encode output: {reason}")))?;

    let mut writer = WavWriter::new(writer, artifact_spec(clip))?;
    for sample in &clip.samples {
        let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write a clip to a WAV file at `path`
pub fn write_wav(clip: &AudioClip, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    encode_wav(clip, std::io::BufWriter::new(file))
}

/// Read a WAV file into an interleaved float clip
pub fn read_wav(path: &Path) -> Result<AudioClip> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = read_samples_as_f32(reader, spec)?;
    Ok(AudioClip::new(samples, spec.sample_rate, spec.channels))
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    spec: WavSpec,
) -> Result<Vec<f32>> {
    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<_, _>>()?,
        // 24-bit is stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits) => {
            tracing::warn!(bits, "unsupported integer bit depth");
            return Err(GenwaveError::Audio(hound::Error::Unsupported));
        }
    };
    Ok(samples)
}
