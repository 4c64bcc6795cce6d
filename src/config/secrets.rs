//! Managed secret store provider
//!
//! The host mounts named secret bundles into a directory. Each bundle is a
//! flat JSON object mapping variable names to values, e.g.
//! `aws-credentials.json` = `{"AWS_ACCESS_KEY_ID": "...", ...}`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::provider::{ConfigProvider, PartialConfig};
use crate::error::{GenwaveError, Result};

/// Bundles consulted, in order
pub const SECRET_BUNDLES: &[&str] = &["aws-credentials", "huggingface-token"];

pub struct SecretStoreProvider {
    root: PathBuf,
    bundles: Vec<String>,
}

impl SecretStoreProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bundles: SECRET_BUNDLES.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn bundle_path(&self, bundle: &str) -> PathBuf {
        self.root.join(format!("{bundle}.json"))
    }

    fn read_bundle(path: &Path) -> Result<HashMap<String, String>> {
        let raw = fs::read_to_string(path).map_err(|e| GenwaveError::Configuration {
            reason: format!("secret bundle {} is unreadable: {}", path.display(), e),
        })?;
        serde_json::from_str(&raw).map_err(|e| GenwaveError::Configuration {
            reason: format!("secret bundle {} is malformed: {}", path.display(), e),
        })
    }
}

impl ConfigProvider for SecretStoreProvider {
    fn name(&self) -> &str {
        "secret-store"
    }

    fn resolve(&self) -> Result<PartialConfig> {
        if !self.root.is_dir() {
            return Ok(PartialConfig::default());
        }

        let mut values = HashMap::new();
        for bundle in &self.bundles {
            let path = self.bundle_path(bundle);
            if !path.is_file() {
                continue;
            }
            let entries = Self::read_bundle(&path)?;
            tracing::debug!(bundle = %bundle, keys = entries.len(), "loaded secret bundle");
            for (key, value) in entries {
                values.entry(key).or_insert(value);
            }
        }

        Ok(PartialConfig::from_lookup(|key| values.get(key).cloned()))
    }
}
