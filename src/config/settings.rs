//! Runtime settings that are not credentials
//!
//! Read from `GENWAVE_*` environment variables with compiled defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{GenwaveError, Result};

pub const ENV_GENERATOR: &str = "GENWAVE_GENERATOR";
pub const ENV_BRIDGE_URL: &str = "GENWAVE_BRIDGE_URL";
pub const ENV_BRIDGE_TIMEOUT_SECS: &str = "GENWAVE_BRIDGE_TIMEOUT_SECS";
pub const ENV_MODEL_CACHE_DIR: &str = "GENWAVE_MODEL_CACHE_DIR";
pub const ENV_SECRETS_DIR: &str = "GENWAVE_SECRETS_DIR";
pub const ENV_WORK_DIR: &str = "GENWAVE_WORK_DIR";
pub const ENV_LOCAL_BUCKET_DIR: &str = "GENWAVE_LOCAL_BUCKET_DIR";
pub const ENV_S3_ENDPOINT_URL: &str = "S3_ENDPOINT_URL";

pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:8001";
pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

/// Which generator backend serves inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorBackend {
    /// External model runtime over HTTP
    Bridge,
    /// Built-in deterministic tone synthesizer
    Tone,
}

impl FromStr for GeneratorBackend {
    type Err = GenwaveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bridge" | "runtime" => Ok(Self::Bridge),
            "tone" | "mock" => Ok(Self::Tone),
            other => Err(GenwaveError::Configuration {
                reason: format!("{ENV_GENERATOR} must be 'bridge' or 'tone', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub generator: GeneratorBackend,
    pub bridge_url: String,
    pub bridge_timeout: Duration,
    /// Forwarded to the runtime so weights persist across invocations
    pub model_cache_dir: Option<PathBuf>,
    pub secrets_dir: PathBuf,
    /// Where temporary WAV files are written; system temp when unset
    pub work_dir: Option<PathBuf>,
    /// Directory-backed bucket used instead of S3 when set
    pub local_bucket_dir: Option<PathBuf>,
    pub s3_endpoint_url: Option<String>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            generator: GeneratorBackend::Bridge,
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            bridge_timeout: DEFAULT_BRIDGE_TIMEOUT,
            model_cache_dir: None,
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
            work_dir: None,
            local_bucket_dir: None,
            s3_endpoint_url: None,
        }
    }
}

impl RuntimeSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let generator = match get(ENV_GENERATOR) {
            Some(value) => value.parse()?,
            None => defaults.generator,
        };
        let bridge_timeout = match get(ENV_BRIDGE_TIMEOUT_SECS) {
            Some(value) => parse_timeout_secs(ENV_BRIDGE_TIMEOUT_SECS, &value)?,
            None => defaults.bridge_timeout,
        };

        Ok(Self {
            generator,
            bridge_url: get(ENV_BRIDGE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.bridge_url),
            bridge_timeout,
            model_cache_dir: get(ENV_MODEL_CACHE_DIR).map(PathBuf::from),
            secrets_dir: get(ENV_SECRETS_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_dir),
            work_dir: get(ENV_WORK_DIR).map(PathBuf::from),
            local_bucket_dir: get(ENV_LOCAL_BUCKET_DIR).map(PathBuf::from),
            s3_endpoint_url: get(ENV_S3_ENDPOINT_URL),
        })
    }
}

fn parse_timeout_secs(name: &str, value: &str) -> Result<Duration> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|_| GenwaveError::Configuration {
            reason: format!("{name} must be a positive integer in seconds"),
        })?;
    if secs == 0 {
        return Err(GenwaveError::Configuration {
            reason: format!("{name} must be greater than 0 seconds"),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<RuntimeSettings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeSettings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.generator, GeneratorBackend::Bridge);
        assert_eq!(s.bridge_url, DEFAULT_BRIDGE_URL);
        assert_eq!(s.bridge_timeout, DEFAULT_BRIDGE_TIMEOUT);
        assert!(s.local_bucket_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            (ENV_GENERATOR, "tone"),
            (ENV_BRIDGE_URL, "http://gpu-box:9000/"),
            (ENV_BRIDGE_TIMEOUT_SECS, "42"),
            (ENV_LOCAL_BUCKET_DIR, "/tmp/bucket"),
        ])
        .unwrap();
        assert_eq!(s.generator, GeneratorBackend::Tone);
        assert_eq!(s.bridge_url, "http://gpu-box:9000");
        assert_eq!(s.bridge_timeout, Duration::from_secs(42));
        assert_eq!(s.local_bucket_dir, Some(PathBuf::from("/tmp/bucket")));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(settings(&[(ENV_BRIDGE_TIMEOUT_SECS, "0")]).is_err());
        assert!(settings(&[(ENV_BRIDGE_TIMEOUT_SECS, "soon")]).is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(settings(&[(ENV_GENERATOR, "gpu")]).is_err());
    }
}
