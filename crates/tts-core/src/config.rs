//! Configuration structures for the TTS service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{TtsError, TtsResult};
use crate::traits::GenerationOptions;
use crate::types::Lang;

/// Pretrained checkpoint served when nothing else is configured.
pub const DEFAULT_MODEL_ID: &str = "parler-tts/parler-tts-mini-v1";

/// Top-level service configuration, usually read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Model source and device settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Sampling settings applied to every generation.
    #[serde(default)]
    pub generation: GenerationOptions,

    /// Inference queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Sentence splitting for the streaming endpoint.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> TtsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TtsError::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> TtsResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TtsError::config(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> TtsResult<()> {
        if self.model.model_id.trim().is_empty() && self.model.model_dir.is_none() {
            return Err(TtsError::config("model.model_id must not be empty"));
        }
        if self.generation.max_tokens == 0 {
            return Err(TtsError::config("generation.max_tokens must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(TtsError::config("generation.top_p must be within [0, 1]"));
        }
        if self.queue.timeout_ms == 0 {
            return Err(TtsError::config("queue.timeout_ms must be > 0"));
        }
        Ok(())
    }
}

/// Model source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// HuggingFace Hub repository of the checkpoint.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Hub revision (branch, tag or commit).
    #[serde(default)]
    pub revision: Option<String>,
    /// Local checkpoint directory; takes precedence over the hub.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    /// Force CPU inference even if an accelerator is available.
    #[serde(default)]
    pub use_cpu: bool,
    /// Data type the weights are loaded as.
    #[serde(default)]
    pub dtype: WeightsDType,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            revision: None,
            model_dir: None,
            use_cpu: false,
            dtype: WeightsDType::default(),
        }
    }
}

/// Data type for model weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightsDType {
    /// 32-bit floating point.
    #[default]
    F32,
    /// 16-bit floating point.
    F16,
    /// Brain floating point 16.
    Bf16,
}

/// Inference queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of requests waiting for the model.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Maximum time a request may wait for the model, in milliseconds.
    #[serde(default = "default_queue_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_pending() -> usize {
    16
}

fn default_queue_timeout_ms() -> u64 {
    120_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
            timeout_ms: default_queue_timeout_ms(),
        }
    }
}

/// Sentence splitting used by the streaming endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Language whose abbreviation rules apply.
    #[serde(default)]
    pub lang: Lang,
    /// Extra abbreviations that never end a sentence, e.g. `"Capt."`.
    #[serde(default)]
    pub abbreviations: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json or text).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address.
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Server port.
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Request body size limit in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Expose Prometheus metrics on `/metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8593
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1 MB
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_size: default_max_body_size(),
            metrics_enabled: default_metrics_enabled(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
