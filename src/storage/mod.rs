//! Object storage
//!
//! `ObjectStore` is the seam between the publisher and the bucket. S3 is
//! the production backend; a directory-backed store serves offline runs.

mod fs;
mod key;
#[cfg(feature = "s3")]
mod s3;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use fs::FsObjectStore;
pub use key::{ObjectKey, TIMESTAMP_FORMAT};
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use crate::config::{Configuration, RuntimeSettings};
use crate::error::Result;

/// Where an uploaded object lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// `s3://bucket/key`
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// A bucket that accepts whole-file uploads
pub trait ObjectStore: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    fn bucket(&self) -> &str;

    /// Upload the file at `path` under `key`. The object is readable as soon
    /// as this returns. Failures are `GenwaveError::Upload`.
    fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<ObjectLocation>;

    fn exists(&self, key: &str) -> Result<bool>;
}

/// Build the store selected by `settings` for the configured bucket
pub fn store_from_settings(
    settings: &RuntimeSettings,
    config: &Configuration,
) -> Result<Box<dyn ObjectStore>> {
    if let Some(dir) = &settings.local_bucket_dir {
        tracing::info!(dir = %dir.display(), "using directory-backed bucket");
        return Ok(Box::new(FsObjectStore::new(dir, &config.bucket_name)));
    }
    s3_store(settings, config)
}

#[cfg(feature = "s3")]
fn s3_store(settings: &RuntimeSettings, config: &Configuration) -> Result<Box<dyn ObjectStore>> {
    Ok(Box::new(S3ObjectStore::new(
        config,
        settings.s3_endpoint_url.as_deref(),
    )?))
}

#[cfg(not(feature = "s3"))]
fn s3_store(_settings: &RuntimeSettings, _config: &Configuration) -> Result<Box<dyn ObjectStore>> {
    Err(crate::error::GenwaveError::Configuration {
        reason: "S3 support not compiled. Build with --features s3 or set GENWAVE_LOCAL_BUCKET_DIR"
            .to_string(),
    })
}
