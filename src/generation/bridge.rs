//! Model runtime bridge
//!
//! Talks to an external generation runtime over HTTP. The runtime owns the
//! pretrained weights, tokenization, sampling and decoding; this client only
//! ships the prompt and receives samples.
//!
//! Protocol:
//! - `GET  {base}/health`   -> 2xx when ready
//! - `POST {base}/generate` -> `BridgeResponse` JSON

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::config::{RuntimeSettings, DEFAULT_BRIDGE_TIMEOUT, DEFAULT_BRIDGE_URL};
use crate::error::{GenwaveError, Result};
use crate::generation::model::{AudioGenerator, GenerationResult, GenerationSpec, GeneratorInfo};

#[derive(Debug, Serialize)]
struct BridgeAudio<'a> {
    sample_rate: u32,
    channels: u16,
    samples: &'a [f32],
}

/// Request sent to the runtime
#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    model: &'a str,
    pretrained_id: String,
    prompt: &'a str,
    duration_secs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    melody: Option<BridgeAudio<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_dir: Option<String>,
}

/// Response from the runtime
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    success: bool,
    #[serde(default)]
    sample_rate: Option<u32>,
    #[serde(default)]
    channels: Option<u16>,
    #[serde(default)]
    samples: Vec<f32>,
    #[serde(default)]
    processing_time_ms: u64,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl BridgeResponse {
    fn failure_reason(&self) -> String {
        let message = self
            .error_message
            .clone()
            .unwrap_or_else(|| "runtime reported failure without a message".to_string());
        match &self.error_code {
            Some(code) => format!("{code}: {message}"),
            None => message,
        }
    }
}

/// HTTP client for the generation runtime
pub struct BridgeGenerator {
    info: GeneratorInfo,
    bridge_url: String,
    timeout: Duration,
    cache_dir: Option<PathBuf>,
}

impl BridgeGenerator {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BRIDGE_URL, DEFAULT_BRIDGE_TIMEOUT)
    }

    pub fn with_config(bridge_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            info: GeneratorInfo {
                id: "bridge".to_string(),
                name: "Model runtime bridge".to_string(),
                description: "Generates audio on an external MusicGen/AudioGen runtime"
                    .to_string(),
                deterministic: false,
            },
            bridge_url: bridge_url.into().trim_end_matches('/').to_string(),
            timeout,
            cache_dir: None,
        }
    }

    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        let mut generator = Self::with_config(settings.bridge_url.clone(), settings.bridge_timeout);
        generator.cache_dir = settings.model_cache_dir.clone();
        generator
    }

    pub fn bridge_url(&self) -> &str {
        &self.bridge_url
    }

    /// Check if the bridge is reachable
    #[cfg(feature = "bridge")]
    fn check_bridge_health(&self) -> bool {
        let client = match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
        {
            Ok(client) => client,
            Err(_) => return false,
        };

        let url = format!("{}/health", self.bridge_url);
        match client.get(&url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    #[cfg(not(feature = "bridge"))]
    fn check_bridge_health(&self) -> bool {
        false
    }

    /// Send request to the bridge
    #[cfg(feature = "bridge")]
    fn send_request(&self, request: &BridgeRequest<'_>) -> Result<BridgeResponse> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GenwaveError::RuntimeUnavailable {
                reason: e.to_string(),
            })?;

        let url = format!("{}/generate", self.bridge_url);

        let response = client.post(&url).json(request).send().map_err(|e| {
            if e.is_timeout() {
                GenwaveError::RuntimeTimeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else if e.is_connect() {
                GenwaveError::RuntimeUnavailable {
                    reason: format!("cannot connect to runtime at {}: {}", self.bridge_url, e),
                }
            } else {
                GenwaveError::generation(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GenwaveError::generation(format!("cannot read runtime response: {e}")))?;

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(GenwaveError::RuntimeUnavailable {
                reason: format!("runtime returned {status}"),
            });
        }

        match serde_json::from_str::<BridgeResponse>(&body) {
            Ok(parsed) if status.is_success() || !parsed.success => Ok(parsed),
            Ok(_) => Err(GenwaveError::generation(format!("runtime returned {status}"))),
            Err(e) if status.is_success() => Err(GenwaveError::generation(format!(
                "invalid response from runtime: {e}"
            ))),
            Err(_) => Err(GenwaveError::generation(format!(
                "runtime returned {status}: {}",
                body.trim()
            ))),
        }
    }

    #[cfg(not(feature = "bridge"))]
    fn send_request(&self, _request: &BridgeRequest<'_>) -> Result<BridgeResponse> {
        Err(GenwaveError::RuntimeUnavailable {
            reason: "bridge support not compiled. Build with --features bridge".to_string(),
        })
    }
}

impl Default for BridgeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGenerator for BridgeGenerator {
    fn info(&self) -> &GeneratorInfo {
        &self.info
    }

    fn is_available(&self) -> bool {
        self.check_bridge_health()
    }

    fn generate(&self, spec: &GenerationSpec<'_>) -> Result<GenerationResult> {
        let start = Instant::now();

        let request = BridgeRequest {
            model: spec.variant.name(),
            pretrained_id: spec.variant.pretrained_id(),
            prompt: spec.prompt,
            duration_secs: spec.duration_secs,
            melody: spec.melody.map(|clip| BridgeAudio {
                sample_rate: clip.sample_rate,
                channels: clip.channels,
                samples: &clip.samples,
            }),
            auth_token: spec.auth_token,
            cache_dir: self
                .cache_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().to_string()),
        };

        tracing::debug!(url = %self.bridge_url, model = request.model, "sending generation request");
        let response = self.send_request(&request)?;

        if !response.success {
            return Err(GenwaveError::generation(response.failure_reason()));
        }
        if response.samples.is_empty() {
            return Err(GenwaveError::generation("runtime returned no audio"));
        }

        let audio = AudioClip::new(
            response.samples,
            response
                .sample_rate
                .unwrap_or_else(|| spec.variant.sample_rate()),
            response.channels.unwrap_or(1),
        );
        audio
            .check()
            .map_err(|reason| GenwaveError::generation(format!("runtime output invalid: {reason}")))?;

        let elapsed = start.elapsed().as_millis() as u64;
        Ok(GenerationResult::new(
            audio,
            response.processing_time_ms.max(elapsed),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::request::ModelVariant;

    #[test]
    fn test_request_omits_absent_fields() {
        let request = BridgeRequest {
            model: "musicgen-small",
            pretrained_id: ModelVariant::MusicgenSmall.pretrained_id(),
            prompt: "jazz",
            duration_secs: 5,
            melody: None,
            auth_token: None,
            cache_dir: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["pretrained_id"], "facebook/musicgen-small");
        assert!(json.get("melody").is_none());
        assert!(json.get("auth_token").is_none());
    }

    #[test]
    fn test_failure_reason_keeps_runtime_message() {
        let response: BridgeResponse = serde_json::from_str(
            r#"{"success": false, "error_code": "OOM", "error_message": "CUDA out of memory"}"#,
        )
        .unwrap();
        assert_eq!(response.failure_reason(), "OOM: CUDA out of memory");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let generator = BridgeGenerator::with_config("http://gpu:8001/", Duration::from_secs(1));
        assert_eq!(generator.bridge_url(), "http://gpu:8001");
    }

    #[test]
    fn test_unreachable_bridge_is_unavailable() {
        let generator = BridgeGenerator::with_config("http://127.0.0.1:1", Duration::from_secs(1));
        assert!(!generator.is_available());
    }
}
