//! Directory-backed bucket for offline runs

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GenwaveError, Result};
use crate::storage::{ObjectLocation, ObjectStore};

/// Stores objects under `<root>/<bucket>/<key>`
pub struct FsObjectStore {
    root: PathBuf,
    bucket: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    /// Filesystem path for `key`
    pub fn object_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.join(&self.bucket);
        for part in key.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }

    fn upload_error(&self, key: &str, e: std::io::Error) -> GenwaveError {
        GenwaveError::Upload {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            reason: e.to_string(),
        }
    }
}

impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn put_file(&self, key: &str, path: &Path, _content_type: &str) -> Result<ObjectLocation> {
        let target = self.object_path(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| self.upload_error(key, e))?;
        }
        fs::copy(path, &target).map_err(|e| self.upload_error(key, e))?;
        tracing::debug!(target = %target.display(), "stored object on disk");
        Ok(ObjectLocation::new(&self.bucket, key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.object_path(key).is_file())
    }
}
