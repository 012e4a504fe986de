//! Unified error types for the TTS service.

use std::path::PathBuf;

/// Main error type for TTS operations.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// Request failed validation before reaching the model.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Tokenization failed.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// Model loading error.
    #[error("model load failed for {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    /// Model inference error.
    #[error("inference error: {0}")]
    Inference(String),

    /// WAV encoding or decoding error.
    #[error("audio encode error: {0}")]
    AudioEncode(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Timed out waiting for the model.
    #[error("operation timeout after {ms}ms")]
    Timeout { ms: u64 },

    /// Too many requests are already waiting for the model.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with TtsError.
pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    /// Create an invalid input error with message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a tokenization error with message.
    pub fn tokenization(msg: impl Into<String>) -> Self {
        Self::Tokenization(msg.into())
    }

    /// Create a model load error for the given path.
    pub fn model_load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an inference error with message.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create an audio encode error with message.
    pub fn audio_encode(msg: impl Into<String>) -> Self {
        Self::AudioEncode(msg.into())
    }

    /// Create a config error with message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a resource exhausted error with message.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Create an internal error with message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Tokenization(_) => "tokenization",
            Self::ModelLoad { .. } => "model_load",
            Self::Inference(_) => "inference",
            Self::AudioEncode(_) => "audio_encode",
            Self::Config(_) => "config",
            Self::Timeout { .. } => "timeout",
            Self::ResourceExhausted(_) => "overloaded",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TtsError::invalid_input("text must not be empty");
        assert_eq!(err.to_string(), "invalid input: text must not be empty");

        let err = TtsError::Timeout { ms: 5000 };
        assert_eq!(err.to_string(), "operation timeout after 5000ms");

        let err = TtsError::model_load("/models/parler", "missing config.json");
        assert_eq!(
            err.to_string(),
            "model load failed for /models/parler: missing config.json"
        );
    }

    #[test]
    fn test_error_constructors() {
        let err = TtsError::tokenization("unknown token");
        assert!(matches!(err, TtsError::Tokenization(_)));

        let err = TtsError::inference("model failed");
        assert!(matches!(err, TtsError::Inference(_)));

        let err = TtsError::audio_encode("writer closed");
        assert!(matches!(err, TtsError::AudioEncode(_)));
    }

    #[test]
    fn test_error_kinds_are_distinct_per_stage() {
        let kinds = [
            TtsError::invalid_input("x").kind(),
            TtsError::tokenization("x").kind(),
            TtsError::inference("x").kind(),
            TtsError::audio_encode("x").kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(TtsError::Timeout { ms: 1 }.kind(), "timeout");
        assert_eq!(TtsError::resource_exhausted("full").kind(), "overloaded");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let err: TtsError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, TtsError::Serialization(_)));
    }
}
