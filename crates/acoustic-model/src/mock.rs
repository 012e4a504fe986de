//! Deterministic stand-in for the acoustic model.
//!
//! Produces a short sine tone whose length depends only on the voice
//! description, so callers can tell which description produced which audio.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use text_tokenizer::MockTokenizer;
use tts_core::{AudioChunk, GenerationOptions, SpeechModel, TextTokenizer, TtsError, TtsResult};

const MOCK_SAMPLE_RATE: u32 = 44_100;
const TONE_HZ: f32 = 220.0;

/// Mock speech model for running the service without weights.
#[derive(Debug, Clone)]
pub struct MockSpeechModel {
    tokenizer: Arc<MockTokenizer>,
    sample_rate: u32,
    fail_on: Option<String>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl Default for MockSpeechModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeechModel {
    pub fn new() -> Self {
        Self {
            tokenizer: Arc::new(MockTokenizer::default()),
            sample_rate: MOCK_SAMPLE_RATE,
            fail_on: None,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail generation when the text or the description contains `needle`
    /// (case-insensitive).
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into().to_lowercase());
        self
    }

    /// Sleep this long inside every generation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of completed or failed generations so far.
    ///
    /// Clones share the counter.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of samples produced for a given voice description.
    pub fn expected_samples(&self, voice_description: &str) -> usize {
        (self.sample_rate as usize / 100) * voice_description.chars().count()
    }
}

impl SpeechModel for MockSpeechModel {
    fn generate(
        &mut self,
        text: &str,
        voice_description: &str,
        _options: &GenerationOptions,
    ) -> TtsResult<AudioChunk> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        self.tokenizer.encode(voice_description)?;
        self.tokenizer.encode(text)?;

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if let Some(needle) = &self.fail_on {
            let hit = [text, voice_description]
                .iter()
                .any(|s| s.to_lowercase().contains(needle.as_str()));
            if hit {
                return Err(TtsError::inference(format!(
                    "mock model refused input containing {needle:?}"
                )));
            }
        }

        let len = self.expected_samples(voice_description);
        let step = 2.0 * std::f32::consts::PI * TONE_HZ / self.sample_rate as f32;
        let pcm = (0..len).map(|i| (i as f32 * step).sin() * 0.3).collect();
        Ok(AudioChunk::new(pcm, self.sample_rate))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "mock"
    }
}
