//! Pipeline Tests
//!
//! End-to-end runs of the generation service with a stub generator and a
//! directory-backed bucket.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use genwave::audio::{write_wav, AudioClip};
use genwave::config::{ConfigResolver, Configuration, EnvProvider, SecretStoreProvider};
use genwave::generation::{
    AudioGenerator, GenerationRequest, GenerationResult, GenerationSpec, GeneratorInfo,
    MelodyPrompt, ModelSize, ModelVariant, ToneGenerator,
};
use genwave::publisher::PublishOptions;
use genwave::service::{health_check, GenerationService, StoreFactory};
use genwave::storage::{FsObjectStore, ObjectLocation, ObjectStore};
use genwave::error::ErrorKind;
use genwave::{GenwaveError, Result};

/// Records every call it sees and answers with a short tone
struct CountingGenerator {
    info: GeneratorInfo,
    calls: Arc<AtomicUsize>,
    seen: Arc<std::sync::Mutex<Vec<(ModelVariant, bool)>>>,
    fail_with: Option<String>,
}

impl CountingGenerator {
    fn new() -> Self {
        Self {
            info: GeneratorInfo {
                id: "counting".to_string(),
                name: "Counting stub".to_string(),
                description: "Test stub".to_string(),
                deterministic: true,
            },
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(std::sync::Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }
}

impl AudioGenerator for CountingGenerator {
    fn info(&self) -> &GeneratorInfo {
        &self.info
    }

    fn generate(&self, spec: &GenerationSpec<'_>) -> Result<GenerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((spec.variant, spec.melody.is_some()));
        if let Some(message) = &self.fail_with {
            return Err(GenwaveError::generation(message.clone()));
        }
        ToneGenerator::new().generate(spec)
    }
}

struct Harness {
    _work: TempDir,
    buckets: TempDir,
    options: PublishOptions,
}

impl Harness {
    fn new() -> Self {
        let work = TempDir::new().unwrap();
        let options = PublishOptions {
            work_dir: Some(work.path().to_path_buf()),
            ..Default::default()
        };
        Self {
            _work: work,
            buckets: TempDir::new().unwrap(),
            options,
        }
    }

    fn work_dir(&self) -> &Path {
        self.options.work_dir.as_deref().unwrap()
    }

    fn store(&self, bucket: &str) -> FsObjectStore {
        FsObjectStore::new(self.buckets.path(), bucket)
    }

    fn store_factory(&self) -> StoreFactory {
        let root = self.buckets.path().to_path_buf();
        Box::new(move |config: &Configuration| {
            Ok(Box::new(FsObjectStore::new(&root, &config.bucket_name)) as Box<dyn ObjectStore>)
        })
    }

    fn service(&self, vars: &[(&str, &str)], generator: CountingGenerator) -> GenerationService {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let resolver = ConfigResolver::new().with_provider(EnvProvider::from_vars(vars));
        GenerationService::new(resolver, Box::new(generator), self.store_factory())
            .with_options(self.options.clone())
    }
}

const CREDENTIALS: &[(&str, &str)] = &[
    ("AWS_ACCESS_KEY_ID", "AKIATEST"),
    ("AWS_SECRET_ACCESS_KEY", "secret"),
    ("S3_BUCKET_NAME", "audio-out"),
];

// === Configuration ===

#[test]
fn test_missing_access_key_never_calls_generator() {
    let harness = Harness::new();
    let generator = CountingGenerator::new();
    let calls = generator.calls.clone();
    let service = harness.service(
        &[("AWS_SECRET_ACCESS_KEY", "secret"), ("S3_BUCKET_NAME", "b")],
        generator,
    );

    let err = service
        .generate(&GenerationRequest::music("ambient pads").with_duration(2))
        .unwrap_err();

    assert!(matches!(
        &err,
        GenwaveError::MissingConfiguration { missing } if missing == &vec!["AWS_ACCESS_KEY_ID"]
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_secret_store_credentials_take_precedence() {
    let harness = Harness::new();
    let secrets = TempDir::new().unwrap();
    std::fs::write(
        secrets.path().join("aws-credentials.json"),
        r#"{"AWS_ACCESS_KEY_ID": "AKIASECRET", "AWS_SECRET_ACCESS_KEY": "s", "S3_BUCKET_NAME": "from-secrets"}"#,
    )
    .unwrap();
    let resolver = ConfigResolver::new()
        .with_provider(SecretStoreProvider::new(secrets.path()))
        .with_provider(EnvProvider::from_vars(
            CREDENTIALS.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        ));
    let service = GenerationService::new(
        resolver,
        Box::new(CountingGenerator::new()),
        harness.store_factory(),
    )
    .with_options(harness.options.clone());

    let report = service
        .generate(&GenerationRequest::music("strings").with_duration(1))
        .unwrap();

    assert_eq!(report.s3_bucket, "from-secrets");
}

// === Publishing ===

#[test]
fn test_artifact_exists_under_configured_bucket() {
    let harness = Harness::new();
    let service = harness.service(CREDENTIALS, CountingGenerator::new());

    let report = service
        .generate(
            &GenerationRequest::music("upbeat synthwave")
                .with_duration(2)
                .with_model_size(ModelSize::Small)
                .with_message_id("run-42"),
        )
        .unwrap();

    assert!(report.success);
    assert_eq!(report.s3_bucket, "audio-out");
    assert!(report.s3_uri.starts_with("s3://audio-out/musicgen/run-42/musicgen_"));
    assert!(report.s3_key.ends_with(".wav"));
    assert_eq!(report.format, "wav");
    assert_eq!(report.model, "facebook/musicgen-small");
    assert_eq!(report.sampling_rate, 32_000);
    assert_eq!(report.duration, 2);
    assert_eq!(report.audio_duration, 2.0);
    assert_eq!(report.file_size_bytes, 44 + 2 * 32_000 * 2);
    assert_eq!(report.message_deduplication_id.as_deref(), Some("run-42"));
    assert!(harness.store("audio-out").exists(&report.s3_key).unwrap());
    assert_eq!(std::fs::read_dir(harness.work_dir()).unwrap().count(), 0);
}

#[test]
fn test_same_request_twice_gets_distinct_keys() {
    let harness = Harness::new();
    let service = harness.service(CREDENTIALS, CountingGenerator::new());
    let request = GenerationRequest::music("lofi beat")
        .with_duration(1)
        .with_message_id("dup");

    let first = service.generate(&request).unwrap();
    let second = service.generate(&request).unwrap();

    assert_ne!(first.s3_key, second.s3_key);
    let store = harness.store("audio-out");
    assert!(store.exists(&first.s3_key).unwrap());
    assert!(store.exists(&second.s3_key).unwrap());
}

#[test]
fn test_sound_effect_uses_audiogen_layout() {
    let harness = Harness::new();
    let service = harness.service(CREDENTIALS, CountingGenerator::new());

    let report = service
        .generate(&GenerationRequest::sound_effect("glass shattering").with_duration(1))
        .unwrap();

    assert!(report.s3_key.starts_with("audiogen/"));
    assert_eq!(report.sampling_rate, 16_000);
    assert_eq!(report.model, "facebook/audiogen-medium");
}

#[test]
fn test_upload_failure_surfaces_and_cleans_up() {
    struct DenyingStore;

    impl ObjectStore for DenyingStore {
        fn name(&self) -> &str {
            "denying"
        }

        fn bucket(&self) -> &str {
            "audio-out"
        }

        fn put_file(&self, key: &str, _path: &Path, _content_type: &str) -> Result<ObjectLocation> {
            Err(GenwaveError::Upload {
                bucket: "audio-out".to_string(),
                key: key.to_string(),
                reason: "AccessDenied".to_string(),
            })
        }

        fn exists(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }
    }

    let harness = Harness::new();
    let resolver = ConfigResolver::new().with_provider(EnvProvider::from_vars(
        CREDENTIALS.iter().map(|(k, v)| (k.to_string(), v.to_string())),
    ));
    let service = GenerationService::new(
        resolver,
        Box::new(CountingGenerator::new()),
        Box::new(|_: &Configuration| {
            Ok(Box::new(DenyingStore) as Box<dyn ObjectStore>)
        }),
    )
    .with_options(harness.options.clone());

    let err = service
        .generate(&GenerationRequest::music("drums").with_duration(1))
        .unwrap_err();

    assert_eq!(err.error_code(), "UPLOAD_ERROR");
    assert!(err.to_string().contains("AccessDenied"));
    assert_eq!(std::fs::read_dir(harness.work_dir()).unwrap().count(), 0);
}

#[test]
fn test_unwritable_work_dir_is_upload_error() {
    let harness = Harness::new();
    let blocker = harness.work_dir().join("plain-file");
    std::fs::write(&blocker, b"").unwrap();
    let options = PublishOptions {
        work_dir: Some(blocker.join("nested")),
        ..Default::default()
    };
    let generator = CountingGenerator::new();
    let calls = generator.calls.clone();
    let service = harness.service(CREDENTIALS, generator).with_options(options);

    let err = service
        .generate(&GenerationRequest::music("field recording").with_duration(1))
        .unwrap_err();

    assert_eq!(err.error_code(), "UPLOAD_ERROR");
    assert_eq!(err.kind(), ErrorKind::Upload);
    assert!(err.to_string().starts_with("Upload of s3://audio-out/musicgen/"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// === Generation ===

#[test]
fn test_generation_failure_is_verbatim() {
    let harness = Harness::new();
    let service = harness.service(CREDENTIALS, CountingGenerator::failing("CUDA out of memory"));

    let err = service
        .generate(&GenerationRequest::music("orchestral").with_duration(1))
        .unwrap_err();

    assert_eq!(err.error_code(), "GENERATION_ERROR");
    assert!(err.to_string().contains("CUDA out of memory"));
    assert_eq!(
        std::fs::read_dir(harness.buckets.path()).unwrap().count(),
        0
    );
}

#[test]
fn test_melody_size_without_reference_generates_from_text() {
    let harness = Harness::new();
    let generator = CountingGenerator::new();
    let seen = generator.seen.clone();
    let service = harness.service(CREDENTIALS, generator);

    let report = service
        .generate(
            &GenerationRequest::music("piano ballad")
                .with_duration(1)
                .with_model_size(ModelSize::Melody),
        )
        .unwrap();

    assert!(report.filename.starts_with("musicgen_melody_"));
    assert!(report.melody_path.is_none());
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[(ModelVariant::MusicgenMelody, false)]
    );
}

#[test]
fn test_melody_reference_is_forwarded() {
    let harness = Harness::new();
    let melody_dir = TempDir::new().unwrap();
    let melody_path = melody_dir.path().join("hum.wav");
    write_wav(&AudioClip::mono(vec![0.25; 3_200], 32_000), &melody_path).unwrap();

    let generator = CountingGenerator::new();
    let seen = generator.seen.clone();
    let service = harness.service(CREDENTIALS, generator);

    let report = service
        .generate(
            &GenerationRequest::music("hummed tune, full band")
                .with_duration(1)
                .with_model_size(ModelSize::Melody)
                .with_melody(MelodyPrompt::new(&melody_path)),
        )
        .unwrap();

    assert_eq!(
        report.melody_path.as_deref(),
        Some(melody_path.display().to_string().as_str())
    );
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[(ModelVariant::MusicgenMelody, true)]
    );
}

#[test]
fn test_invalid_duration_never_calls_generator() {
    let harness = Harness::new();
    let generator = CountingGenerator::new();
    let calls = generator.calls.clone();
    let service = harness.service(CREDENTIALS, generator);

    let err = service
        .generate(&GenerationRequest::music("too long").with_duration(301))
        .unwrap_err();

    assert_eq!(err.error_code(), "INVALID_REQUEST");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// === Self checks ===

#[test]
fn test_health_check_needs_no_credentials() {
    let report = health_check();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "genwave");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
