//! Trait definitions for the generation stack.

use serde::{Deserialize, Serialize};

use crate::error::TtsResult;
use crate::types::AudioChunk;

/// Text tokenization trait.
///
/// Implementations convert prompt or description text into token IDs
/// understood by the text encoder of the acoustic model.
pub trait TextTokenizer: Send + Sync {
    /// Encode text into token IDs, including special tokens.
    fn encode(&self, text: &str) -> TtsResult<Vec<u32>>;
}

/// A text-to-speech model conditioned on a voice description.
///
/// Generation takes `&mut self`: models keep per-call decoding state
/// (KV caches), so callers must serialize access.
pub trait SpeechModel: Send {
    /// Speak `text` in the voice described by `voice_description`.
    fn generate(
        &mut self,
        text: &str,
        voice_description: &str,
        options: &GenerationOptions,
    ) -> TtsResult<AudioChunk>;

    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Human-readable model identifier.
    fn name(&self) -> &str;
}

/// Generation options for the acoustic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Maximum number of decoder steps.
    pub max_tokens: usize,
    /// Temperature for sampling (0.0 = greedy).
    pub temperature: f64,
    /// Top-k sampling parameter (0 = disabled).
    pub top_k: usize,
    /// Top-p (nucleus) sampling parameter (1.0 = disabled).
    pub top_p: f64,
    /// Random seed; a fresh one is drawn per call when unset.
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2580,
            temperature: 1.0,
            top_k: 0,
            top_p: 1.0,
            seed: None,
        }
    }
}

impl GenerationOptions {
    /// Create new generation options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of decoder steps.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set top-k sampling.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set top-p sampling.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
