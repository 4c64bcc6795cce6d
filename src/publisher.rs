//! Artifact publishing
//!
//! Post-processes generated audio, writes it to a scoped temporary WAV file
//! and uploads that file to the object store. The temporary file is removed
//! when the `Artifact` drops, whether or not the upload succeeded.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::audio::{encode_wav, NormalizeStrategy};
use crate::error::{GenwaveError, Result};
use crate::generation::{GenerationResult, ModelVariant};
use crate::storage::{ObjectKey, ObjectLocation, ObjectStore};

pub const WAV_CONTENT_TYPE: &str = "audio/wav";

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub normalize: NormalizeStrategy,
    /// Embed the encoded WAV as base64 in the published record
    pub include_audio: bool,
    /// Directory for temporary files, system temp when `None`
    pub work_dir: Option<PathBuf>,
}

/// A WAV file on local disk, waiting to be uploaded
pub struct Artifact {
    file: NamedTempFile,
    pub object_key: ObjectKey,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

impl Artifact {
    /// Downmix, normalize and write `result` to a temporary WAV file that
    /// will be uploaded under `object_key`.
    pub fn create(
        result: GenerationResult,
        object_key: ObjectKey,
        options: &PublishOptions,
    ) -> Result<Self> {
        let mut clip = result.audio.to_mono();
        options.normalize.apply(&mut clip);

        let prefix = format!("{}_", object_key.generator_name());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".wav");
        let mut file = match &options.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };

        encode_wav(&clip, BufWriter::new(file.as_file_mut()))?;
        tracing::debug!(path = %file.path().display(), "wrote local artifact");

        Ok(Self {
            file,
            object_key,
            sample_rate: clip.sample_rate,
            duration_secs: clip.duration_secs(),
        })
    }

    pub fn local_path(&self) -> &Path {
        self.file.path()
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.file.path())?)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Record of a completed upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub location: ObjectLocation,
    pub file_name: String,
    pub generation_id: Uuid,
    pub size_bytes: u64,
    pub sha256: String,
    pub sample_rate: u32,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
}

pub struct ArtifactPublisher<'a> {
    store: &'a dyn ObjectStore,
    options: &'a PublishOptions,
}

impl<'a> ArtifactPublisher<'a> {
    pub fn new(store: &'a dyn ObjectStore, options: &'a PublishOptions) -> Self {
        Self { store, options }
    }

    /// Write the local artifact. Failures of the local file count as upload
    /// failures for the object they were destined for.
    pub fn prepare(
        &self,
        result: GenerationResult,
        variant: ModelVariant,
        message_id: Option<&str>,
    ) -> Result<Artifact> {
        let object_key = ObjectKey::new(variant, message_id, Uuid::new_v4(), Utc::now());
        let key = object_key.as_key();
        Artifact::create(result, object_key, self.options).map_err(|e| self.local_failure(&key, e))
    }

    fn local_failure(&self, key: &str, err: GenwaveError) -> GenwaveError {
        match err {
            GenwaveError::Io(_) | GenwaveError::Audio(_) => GenwaveError::Upload {
                bucket: self.store.bucket().to_string(),
                key: key.to_string(),
                reason: format!("cannot write local artifact: {err}"),
            },
            other => other,
        }
    }

    /// Upload a prepared artifact. Consumes it, so the local file is gone
    /// once this returns.
    pub fn upload(&self, artifact: Artifact) -> Result<PublishedArtifact> {
        let key = artifact.object_key.as_key();
        let bytes = artifact
            .read_bytes()
            .map_err(|e| self.local_failure(&key, e))?;
        let sha256 = sha256_hex(&bytes);

        tracing::info!(
            store = self.store.name(),
            bucket = self.store.bucket(),
            key = %key,
            bytes = bytes.len(),
            "uploading artifact"
        );
        let location = self
            .store
            .put_file(&key, artifact.local_path(), WAV_CONTENT_TYPE)?;
        tracing::info!(uri = %location.uri(), "artifact uploaded");

        Ok(PublishedArtifact {
            location,
            file_name: artifact.object_key.file_name(),
            generation_id: artifact.object_key.generation_id(),
            size_bytes: bytes.len() as u64,
            sha256,
            sample_rate: artifact.sample_rate,
            duration_secs: artifact.duration_secs,
            audio_base64: self
                .options
                .include_audio
                .then(|| encode_base64(&bytes)),
        })
    }

    pub fn publish(
        &self,
        result: GenerationResult,
        variant: ModelVariant,
        message_id: Option<&str>,
    ) -> Result<PublishedArtifact> {
        let artifact = self.prepare(result, variant, message_id)?;
        self.upload(artifact)
    }
}
