//! Configuration resolution
//!
//! Credentials and bucket settings come from an ordered list of providers:
//! - managed secret store (mounted JSON bundles)
//! - process environment
//! - `.env` file in the working directory
//!
//! The first provider holding a value wins. The result is a plain
//! `Configuration` value built once per invocation and passed explicitly.

mod env;
mod provider;
mod secrets;
mod settings;

use std::path::Path;

pub use env::{DotEnvProvider, EnvProvider};
pub use provider::{ConfigProvider, ConfigResolver, PartialConfig};
pub use secrets::{SecretStoreProvider, SECRET_BUNDLES};
pub use settings::*;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_REGION: &str = "AWS_REGION";
pub const S3_BUCKET_NAME: &str = "S3_BUCKET_NAME";
pub const HUGGING_FACE_TOKEN: &str = "HUGGING_FACE_TOKEN";

pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Credentials and destination for one invocation
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    pub aws_access_key: String,
    pub aws_secret_key: String,
    pub aws_region: String,
    pub bucket_name: String,
    /// Token for gated model downloads; public access when absent
    pub model_auth_token: Option<String>,
}

impl Configuration {
    /// Standard provider chain: secret store, environment, `.env`.
    pub fn resolver(secrets_dir: &Path) -> ConfigResolver {
        ConfigResolver::new()
            .with_provider(SecretStoreProvider::new(secrets_dir))
            .with_provider(EnvProvider::process())
            .with_provider(DotEnvProvider::new(".env"))
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("aws_access_key", &"<redacted>")
            .field("aws_secret_key", &"<redacted>")
            .field("aws_region", &self.aws_region)
            .field("bucket_name", &self.bucket_name)
            .field(
                "model_auth_token",
                &self.model_auth_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
