//! # text-tokenizer
//!
//! Text processing for the Parler-TTS service:
//! - [`Tokenizer`]: a wrapper over HuggingFace `tokenizers` producing the
//!   token IDs fed to the model's text encoder and prompt embedding
//! - [`sentences`]: the language-aware sentence splitter used for
//!   sentence-chunked streaming
//!
//! # Example
//!
//! ```ignore
//! use text_tokenizer::Tokenizer;
//! use tts_core::TextTokenizer;
//!
//! let tokenizer = Tokenizer::from_file("tokenizer.json")?;
//! let ids = tokenizer.encode("A calm female voice.")?;
//! println!("Token IDs: {:?}", ids);
//! ```

pub mod sentences;

use std::path::Path;

use tracing::instrument;
use tts_core::{TextTokenizer, TtsError, TtsResult};

pub use sentences::{SentenceSplitter, split_sentences};

/// Tokenizer wrapper for Parler-TTS checkpoints (T5 vocabulary).
#[derive(Debug)]
pub struct Tokenizer {
    inner: tokenizers::Tokenizer,
}

impl Tokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> TtsResult<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TtsError::model_load(path, e.to_string()))?;
        Ok(Self { inner })
    }

    /// Create a tokenizer from JSON bytes.
    pub fn from_bytes(json: impl AsRef<[u8]>) -> TtsResult<Self> {
        let inner = tokenizers::Tokenizer::from_bytes(json)
            .map_err(|e| TtsError::config(format!("invalid tokenizer JSON: {e}")))?;
        Ok(Self { inner })
    }
}

impl TextTokenizer for Tokenizer {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    fn encode(&self, text: &str) -> TtsResult<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| TtsError::tokenization(e.to_string()))?;

        let ids = encoding.get_ids().to_vec();
        if ids.is_empty() {
            return Err(TtsError::tokenization("input produced no tokens"));
        }
        Ok(ids)
    }
}

/// A mock tokenizer for testing without model files.
///
/// Encodes characters to IDs modulo the vocabulary size and appends EOS (1).
/// NUL characters are rejected so tests can exercise tokenizer failures.
#[derive(Debug)]
pub struct MockTokenizer {
    vocab_size: usize,
}

impl Default for MockTokenizer {
    fn default() -> Self {
        Self::new(32128)
    }
}

impl MockTokenizer {
    /// Create a new mock tokenizer.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size: vocab_size.max(3),
        }
    }
}

impl TextTokenizer for MockTokenizer {
    fn encode(&self, text: &str) -> TtsResult<Vec<u32>> {
        if text.contains('\0') {
            return Err(TtsError::tokenization("NUL character in input"));
        }
        let vocab = self.vocab_size as u32;
        let mut ids: Vec<u32> = text.chars().map(|c| 2 + (c as u32) % (vocab - 2)).collect();
        ids.push(1);
        Ok(ids)
    }
}
