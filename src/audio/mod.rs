//! Audio handling for generated output
//!
//! - `AudioClip`: interleaved float samples with rate and channel count
//! - level normalization before the artifact is written
//! - WAV encode/decode via hound

mod clip;
mod normalize;
mod wav;

pub use clip::AudioClip;
pub use normalize::{NormalizeStrategy, LOUDNESS_TARGET_DB, PEAK_CEILING};
pub use wav::{encode_wav, read_wav, write_wav, ARTIFACT_BITS_PER_SAMPLE};
