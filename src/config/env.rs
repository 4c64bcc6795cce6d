//! Environment-backed providers: process environment and `.env` file

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::provider::{ConfigProvider, PartialConfig};
use crate::error::{GenwaveError, Result};

/// Reads configuration from a snapshot of environment variables
pub struct EnvProvider {
    vars: HashMap<String, String>,
}

impl EnvProvider {
    /// Snapshot the current process environment
    pub fn process() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigProvider for EnvProvider {
    fn name(&self) -> &str {
        "environment"
    }

    fn resolve(&self) -> Result<PartialConfig> {
        Ok(PartialConfig::from_lookup(|key| self.vars.get(key).cloned()))
    }
}

/// Reads a `.env` file without touching the process environment
pub struct DotEnvProvider {
    path: PathBuf,
}

impl DotEnvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigProvider for DotEnvProvider {
    fn name(&self) -> &str {
        "dotenv"
    }

    fn resolve(&self) -> Result<PartialConfig> {
        if !self.path.is_file() {
            return Ok(PartialConfig::default());
        }

        let iter = dotenvy::from_path_iter(&self.path).map_err(|e| GenwaveError::Configuration {
            reason: format!("cannot read {}: {}", self.path.display(), e),
        })?;

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| GenwaveError::Configuration {
                reason: format!("invalid line in {}: {}", self.path.display(), e),
            })?;
            values.insert(key, value);
        }

        Ok(PartialConfig::from_lookup(|key| values.get(key).cloned()))
    }
}
