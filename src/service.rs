//! Generation service
//!
//! Wires the three stages together for one invocation:
//! configuration → inference → publish. Also hosts the two self checks that
//! run without credentials.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{ConfigResolver, Configuration, RuntimeSettings};
use crate::error::{ErrorKind, GenwaveError, Result};
use crate::generation::{
    generator_from_settings, invoke, AudioGenerator, GenerationRequest, ModelSize, ToneGenerator,
};
use crate::publisher::{encode_base64, sha256_hex, Artifact, ArtifactPublisher, PublishOptions};
use crate::storage::{store_from_settings, ObjectKey, ObjectStore};

pub const SERVICE_NAME: &str = "genwave";

/// Builds the object store once credentials are known
pub type StoreFactory = Box<dyn Fn(&Configuration) -> Result<Box<dyn ObjectStore>> + Send + Sync>;

/// Payload for a successful generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub success: bool,
    pub s3_uri: String,
    pub s3_bucket: String,
    pub s3_key: String,
    pub filename: String,
    pub sampling_rate: u32,
    /// Requested length in seconds
    pub duration: u32,
    /// Length of the encoded audio in seconds
    pub audio_duration: f64,
    pub format: &'static str,
    pub file_size_bytes: u64,
    pub sha256: String,
    pub prompt_used: String,
    pub model_size: ModelSize,
    pub model: String,
    pub message_deduplication_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub melody_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Payload of the offline self test
#[derive(Debug, Clone, Serialize)]
pub struct SimpleTestReport {
    pub success: bool,
    pub status: &'static str,
    pub generator: String,
    pub model: String,
    pub sampling_rate: u32,
    pub duration: u32,
    pub audio_duration: f64,
    pub format: &'static str,
    pub file_size_bytes: u64,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
}

/// Payload printed when any entry point fails
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub success: bool,
    pub error_code: &'static str,
    pub kind: ErrorKind,
    pub error: String,
}

impl From<&GenwaveError> for ErrorReport {
    fn from(err: &GenwaveError) -> Self {
        Self {
            success: false,
            error_code: err.error_code(),
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

pub struct GenerationService {
    resolver: ConfigResolver,
    generator: Box<dyn AudioGenerator>,
    store_factory: StoreFactory,
    options: PublishOptions,
}

impl GenerationService {
    pub fn new(
        resolver: ConfigResolver,
        generator: Box<dyn AudioGenerator>,
        store_factory: StoreFactory,
    ) -> Self {
        Self {
            resolver,
            generator,
            store_factory,
            options: PublishOptions::default(),
        }
    }

    /// Production wiring: standard provider chain, backend and store picked
    /// from `settings`.
    pub fn from_settings(settings: RuntimeSettings) -> Self {
        let resolver = Configuration::resolver(&settings.secrets_dir);
        let generator = generator_from_settings(&settings);
        let options = PublishOptions {
            work_dir: settings.work_dir.clone(),
            ..Default::default()
        };
        let store_factory: StoreFactory =
            Box::new(move |config: &Configuration| store_from_settings(&settings, config));
        Self::new(resolver, generator, store_factory).with_options(options)
    }

    pub fn with_options(mut self, options: PublishOptions) -> Self {
        self.options = options;
        self
    }

    pub fn generator(&self) -> &dyn AudioGenerator {
        self.generator.as_ref()
    }

    /// Generate, publish and describe one artifact.
    ///
    /// Configuration is resolved before anything else, so a missing
    /// credential never reaches the model runtime.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport> {
        let config = self.resolver.resolve()?;
        let variant = request.validate()?;
        let store = (self.store_factory)(&config)?;

        let result = invoke(
            self.generator.as_ref(),
            request,
            variant,
            config.model_auth_token.as_deref(),
        )?;

        let publisher = ArtifactPublisher::new(store.as_ref(), &self.options);
        let published = publisher.publish(result, variant, request.message_id.as_deref())?;

        Ok(GenerationReport {
            success: true,
            s3_uri: published.location.uri(),
            s3_bucket: published.location.bucket,
            s3_key: published.location.key,
            filename: published.file_name,
            sampling_rate: published.sample_rate,
            duration: request.duration_secs,
            audio_duration: published.duration_secs,
            format: "wav",
            file_size_bytes: published.size_bytes,
            sha256: published.sha256,
            prompt_used: request.prompt.clone(),
            model_size: request.model_size,
            model: variant.pretrained_id(),
            message_deduplication_id: request.message_id.clone(),
            melody_path: request
                .melody_prompt
                .as_ref()
                .map(|m| m.path.display().to_string()),
            audio_base64: published.audio_base64,
        })
    }
}

/// Liveness check. Touches no credentials, network or model.
pub fn health_check() -> HealthReport {
    HealthReport {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    }
}

/// Offline end-to-end check: a fixed request through the tone generator and
/// the WAV encoder into a temp file. Nothing is uploaded.
pub fn simple_test(options: &PublishOptions) -> Result<SimpleTestReport> {
    let request = GenerationRequest::music("simple test tone")
        .with_duration(1)
        .with_model_size(ModelSize::Small);
    let variant = request.validate()?;
    let generator = ToneGenerator::new();

    let result = invoke(&generator, &request, variant, None)?;
    let key = ObjectKey::new(variant, None, Uuid::new_v4(), Utc::now());
    let artifact = Artifact::create(result, key, options)?;
    let bytes = artifact.read_bytes()?;
    tracing::info!(bytes = bytes.len(), "simple test encoded audio");

    Ok(SimpleTestReport {
        success: true,
        status: "ok",
        generator: generator.id().to_string(),
        model: variant.pretrained_id(),
        sampling_rate: artifact.sample_rate,
        duration: request.duration_secs,
        audio_duration: artifact.duration_secs,
        format: "wav",
        file_size_bytes: bytes.len() as u64,
        sha256: sha256_hex(&bytes),
        audio_base64: options.include_audio.then(|| encode_base64(&bytes)),
    })
}
