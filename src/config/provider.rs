//! Configuration providers and first-present-wins merging

use crate::config::{
    Configuration, AWS_ACCESS_KEY_ID, AWS_REGION, AWS_SECRET_ACCESS_KEY, DEFAULT_AWS_REGION,
    HUGGING_FACE_TOKEN, S3_BUCKET_NAME,
};
use crate::error::{GenwaveError, Result};

/// Configuration values found in a single source. Any field may be absent.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct PartialConfig {
    pub aws_access_key: Option<String>,
    pub aws_secret_key: Option<String>,
    pub aws_region: Option<String>,
    pub bucket_name: Option<String>,
    pub model_auth_token: Option<String>,
}

impl PartialConfig {
    /// Build from a key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            aws_access_key: get(AWS_ACCESS_KEY_ID),
            aws_secret_key: get(AWS_SECRET_ACCESS_KEY),
            aws_region: get(AWS_REGION),
            bucket_name: get(S3_BUCKET_NAME),
            model_auth_token: get(HUGGING_FACE_TOKEN),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill fields still missing in `self` from `fallback`.
    pub fn or(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            aws_access_key: self.aws_access_key.or(fallback.aws_access_key),
            aws_secret_key: self.aws_secret_key.or(fallback.aws_secret_key),
            aws_region: self.aws_region.or(fallback.aws_region),
            bucket_name: self.bucket_name.or(fallback.bucket_name),
            model_auth_token: self.model_auth_token.or(fallback.model_auth_token),
        }
    }

    /// Names of the required settings not present.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.aws_access_key.is_none() {
            missing.push(AWS_ACCESS_KEY_ID);
        }
        if self.aws_secret_key.is_none() {
            missing.push(AWS_SECRET_ACCESS_KEY);
        }
        if self.bucket_name.is_none() {
            missing.push(S3_BUCKET_NAME);
        }
        missing
    }

    /// Turn the merged partial into a complete configuration.
    pub fn finish(self) -> Result<Configuration> {
        let missing = self.missing_required();
        match (self.aws_access_key, self.aws_secret_key, self.bucket_name) {
            (Some(aws_access_key), Some(aws_secret_key), Some(bucket_name)) => Ok(Configuration {
                aws_access_key,
                aws_secret_key,
                aws_region: self
                    .aws_region
                    .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
                bucket_name,
                model_auth_token: self.model_auth_token,
            }),
            _ => Err(GenwaveError::MissingConfiguration { missing }),
        }
    }
}

impl std::fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("PartialConfig")
            .field("aws_access_key", &shown(&self.aws_access_key))
            .field("aws_secret_key", &shown(&self.aws_secret_key))
            .field("aws_region", &self.aws_region)
            .field("bucket_name", &self.bucket_name)
            .field("model_auth_token", &shown(&self.model_auth_token))
            .finish()
    }
}

/// A single source of configuration values
pub trait ConfigProvider {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Read whatever this source has. An unavailable source yields an
    /// empty partial, not an error.
    fn resolve(&self) -> Result<PartialConfig>;
}

/// Ordered list of providers, earlier providers win
pub struct ConfigResolver {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Merge all providers and validate the required settings.
    pub fn resolve(&self) -> Result<Configuration> {
        let mut merged = PartialConfig::default();
        for provider in &self.providers {
            let partial = provider.resolve()?;
            if partial.is_empty() {
                tracing::debug!(provider = provider.name(), "provider has no values");
                continue;
            }
            tracing::debug!(provider = provider.name(), values = ?partial, "provider resolved");
            merged = merged.or(partial);
        }

        let config = merged.finish()?;
        if config.model_auth_token.is_none() {
            tracing::info!("no model auth token configured, using public model access");
        }
        Ok(config)
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixed(&'static str, PartialConfig);

    impl ConfigProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn resolve(&self) -> Result<PartialConfig> {
            Ok(self.1.clone())
        }
    }

    struct Counting(Rc<Cell<usize>>);

    impl ConfigProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn resolve(&self) -> Result<PartialConfig> {
            self.0.set(self.0.get() + 1);
            Ok(PartialConfig::default())
        }
    }

    fn partial(pairs: &[(&str, &str)]) -> PartialConfig {
        PartialConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn test_first_present_wins() {
        let resolver = ConfigResolver::new()
            .with_provider(Fixed(
                "secrets",
                partial(&[(AWS_ACCESS_KEY_ID, "from-secrets"), (S3_BUCKET_NAME, "bucket-a")]),
            ))
            .with_provider(Fixed(
                "env",
                partial(&[
                    (AWS_ACCESS_KEY_ID, "from-env"),
                    (AWS_SECRET_ACCESS_KEY, "env-secret"),
                    (S3_BUCKET_NAME, "bucket-b"),
                    (AWS_REGION, "eu-west-1"),
                ]),
            ));

        let config = resolver.resolve().unwrap();
        assert_eq!(config.aws_access_key, "from-secrets");
        assert_eq!(config.aws_secret_key, "env-secret");
        assert_eq!(config.bucket_name, "bucket-a");
        assert_eq!(config.aws_region, "eu-west-1");
        assert!(config.model_auth_token.is_none());
    }

    #[test]
    fn test_region_defaults() {
        let config = partial(&[
            (AWS_ACCESS_KEY_ID, "k"),
            (AWS_SECRET_ACCESS_KEY, "s"),
            (S3_BUCKET_NAME, "b"),
        ])
        .finish()
        .unwrap();
        assert_eq!(config.aws_region, DEFAULT_AWS_REGION);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let p = partial(&[(AWS_ACCESS_KEY_ID, "   "), (S3_BUCKET_NAME, "b")]);
        assert!(p.aws_access_key.is_none());
        assert_eq!(
            p.missing_required(),
            vec![AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY]
        );
    }

    #[test]
    fn test_missing_lists_every_field() {
        let err = ConfigResolver::new().resolve().unwrap_err();
        match err {
            GenwaveError::MissingConfiguration { missing } => {
                assert_eq!(
                    missing,
                    vec![AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, S3_BUCKET_NAME]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_every_provider_consulted() {
        let calls = Rc::new(Cell::new(0));
        let resolver = ConfigResolver::new()
            .with_provider(Counting(calls.clone()))
            .with_provider(Counting(calls.clone()));
        assert!(resolver.resolve().is_err());
        assert_eq!(calls.get(), 2);
        assert_eq!(resolver.provider_names(), vec!["counting", "counting"]);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let p = partial(&[(AWS_SECRET_ACCESS_KEY, "hunter2")]);
        let shown = format!("{p:?}");
        assert!(!shown.contains("hunter2"));
    }
}
