//! Core data types for speech generation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{TtsError, TtsResult};

/// Languages with dedicated sentence segmentation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// English language.
    #[default]
    En,
    /// Russian language.
    Ru,
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lang::En => write!(f, "en"),
            Lang::Ru => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for Lang {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ru" | "russian" => Ok(Self::Ru),
            _ => Err(TtsError::config(format!("unknown language: {s}"))),
        }
    }
}

/// Response encoding for generated audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Base64-encoded WAV (JSON envelope, or one line per streamed chunk).
    #[default]
    Base64,
    /// Raw WAV bytes.
    Wav,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Base64 => write!(f, "base64"),
            OutputFormat::Wav => write!(f, "wav"),
        }
    }
}

/// A speech generation request as received over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Content to speak.
    pub text: String,
    /// Natural-language description of the voice.
    #[serde(alias = "voiceDescription")]
    pub voice_description: String,
    /// Requested response encoding.
    #[serde(default, alias = "outputFormat", skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

impl GenerationRequest {
    /// The requested format, falling back to base64.
    pub fn format(&self) -> OutputFormat {
        self.output_format.unwrap_or_default()
    }
}

/// Check that both generation inputs carry non-whitespace content.
pub fn validate_inputs(text: &str, voice_description: &str) -> TtsResult<()> {
    if text.trim().is_empty() {
        return Err(TtsError::invalid_input("text must not be empty"));
    }
    if voice_description.trim().is_empty() {
        return Err(TtsError::invalid_input(
            "voice_description must not be empty",
        ));
    }
    Ok(())
}

/// A mono waveform produced by one model invocation.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM samples (f32, mono).
    pub pcm: Arc<[f32]>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioChunk {
    /// Create a new audio chunk.
    pub fn new(pcm: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            pcm: pcm.into(),
            sample_rate,
        }
    }

    /// Get the duration of this chunk in milliseconds.
    pub fn duration_ms(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.pcm.len() as f32 * 1000.0 / self.sample_rate as f32
    }

    /// Get the number of samples in this chunk.
    pub fn num_samples(&self) -> usize {
        self.pcm.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_display_and_parse() {
        assert_eq!(Lang::En.to_string(), "en");
        assert_eq!(Lang::Ru.to_string(), "ru");
        assert_eq!("English".parse::<Lang>().unwrap(), Lang::En);
        assert_eq!("ru".parse::<Lang>().unwrap(), Lang::Ru);
        assert!("klingon".parse::<Lang>().is_err());
    }

    #[test]
    fn test_request_snake_case_fields() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"text": "Hello", "voice_description": "calm voice", "output_format": "wav"}"#,
        )
        .unwrap();
        assert_eq!(req.text, "Hello");
        assert_eq!(req.voice_description, "calm voice");
        assert_eq!(req.format(), OutputFormat::Wav);
    }

    #[test]
    fn test_request_camel_case_aliases() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"text": "Hello", "voiceDescription": "calm voice", "outputFormat": "base64"}"#,
        )
        .unwrap();
        assert_eq!(req.voice_description, "calm voice");
        assert_eq!(req.output_format, Some(OutputFormat::Base64));
    }

    #[test]
    fn test_request_default_format() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{"text": "Hello", "voice_description": "calm"}"#).unwrap();
        assert_eq!(req.output_format, None);
        assert_eq!(req.format(), OutputFormat::Base64);
    }

    #[test]
    fn test_request_missing_description_rejected() {
        let res = serde_json::from_str::<GenerationRequest>(r#"{"text": "Hello"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_request_unknown_format_rejected() {
        let res = serde_json::from_str::<GenerationRequest>(
            r#"{"text": "a", "voice_description": "b", "output_format": "mp3"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_validate_blank_fields() {
        assert!(validate_inputs("Hello", "calm").is_ok());
        assert!(matches!(
            validate_inputs("", "calm"),
            Err(TtsError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_inputs("Hello", "   \n"),
            Err(TtsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_audio_chunk() {
        let chunk = AudioChunk::new(vec![0.0; 1000], 16000);
        assert_eq!(chunk.duration_ms(), 62.5);
        assert_eq!(chunk.num_samples(), 1000);
        assert_eq!(AudioChunk::new(Vec::new(), 0).duration_ms(), 0.0);
    }
}
