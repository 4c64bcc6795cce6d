//! Genwave - Generative Audio Orchestration
//!
//! Turns a text prompt into a durable WAV artifact in object storage:
//! 1. Configuration - credentials and bucket from secret store, environment or `.env`
//! 2. Generation - one call on a model runtime (MusicGen / AudioGen checkpoints)
//! 3. Publishing - WAV encoding, temp-file lifecycle and upload
//!
//! # Architecture
//!
//! Each stage sits behind a trait (`ConfigProvider`, `AudioGenerator`,
//! `ObjectStore`) so tests can substitute stubs. `GenerationService` runs
//! the stages in order for a single invocation.

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod publisher;
pub mod service;
pub mod storage;

pub use error::{GenwaveError, Result};
