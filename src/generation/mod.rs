//! Generation requests and backends
//!
//! This module provides:
//! - `GenerationRequest` with bounds checking and model variant selection
//! - `AudioGenerator` trait for inference backends
//! - `BridgeGenerator` (external model runtime over HTTP)
//! - `ToneGenerator` (deterministic, no inference)

mod bridge;
mod invoker;
mod model;
mod request;
mod tone;

pub use bridge::BridgeGenerator;
pub use invoker::invoke;
pub use model::{AudioGenerator, GenerationResult, GenerationSpec, GeneratorInfo};
pub use request::*;
pub use tone::ToneGenerator;

use crate::config::{GeneratorBackend, RuntimeSettings};

/// Build the backend selected in `settings`
pub fn generator_from_settings(settings: &RuntimeSettings) -> Box<dyn AudioGenerator> {
    match settings.generator {
        GeneratorBackend::Bridge => Box::new(BridgeGenerator::from_settings(settings)),
        GeneratorBackend::Tone => Box::new(ToneGenerator::new()),
    }
}
