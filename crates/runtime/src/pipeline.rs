//! Speech pipeline: request validation, gated generation and WAV encoding.
//!
//! Combines the components: sentence splitter → inference gate → speech
//! model (blocking pool) → WAV encoder.

use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures::Stream;
use parking_lot::Mutex;
use text_tokenizer::SentenceSplitter;
use tracing::{Instrument, Span, debug, error, info, instrument};
use tts_core::types::validate_inputs;
use tts_core::{AudioChunk, GenerationOptions, QueueConfig, SpeechModel, TtsError, TtsResult};

use crate::metrics::TtsMetrics;
use crate::queue::InferenceGate;

/// The shared speech pipeline, injected into request handlers.
pub struct SpeechPipeline {
    model: Arc<Mutex<Box<dyn SpeechModel>>>,
    gate: InferenceGate,
    splitter: SentenceSplitter,
    options: GenerationOptions,
    model_name: String,
    sample_rate: u32,
    device: String,
    metrics: TtsMetrics,
}

impl std::fmt::Debug for SpeechPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechPipeline")
            .field("model", &self.model_name)
            .field("device", &self.device)
            .field("sample_rate", &self.sample_rate)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl SpeechPipeline {
    /// Wrap a loaded model.
    pub fn new(
        model: impl SpeechModel + 'static,
        options: GenerationOptions,
        queue: &QueueConfig,
    ) -> Self {
        let model_name = model.name().to_string();
        let sample_rate = model.sample_rate();
        info!(model = %model_name, sample_rate, "Speech pipeline created");

        Self {
            model: Arc::new(Mutex::new(Box::new(model))),
            gate: InferenceGate::new(queue),
            splitter: SentenceSplitter::default(),
            options,
            model_name,
            sample_rate,
            device: "cpu".to_string(),
            metrics: TtsMetrics,
        }
    }

    /// Record the device name reported by `/health`.
    pub fn with_device_name(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Replace the sentence splitter used for streaming.
    pub fn with_splitter(mut self, splitter: SentenceSplitter) -> Self {
        info!(lang = %splitter.lang(), "Sentence splitter configured");
        self.splitter = splitter;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn device_name(&self) -> &str {
        &self.device
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn gate(&self) -> &InferenceGate {
        &self.gate
    }

    /// Sentences a voice description is streamed as.
    pub fn split_sentences(&self, voice_description: &str) -> Vec<String> {
        self.splitter.split(voice_description)
    }

    /// Generate the whole utterance with one model invocation.
    #[instrument(skip_all, fields(text_len = text.len(), description_len = voice_description.len()))]
    pub async fn synthesize(&self, text: &str, voice_description: &str) -> TtsResult<AudioChunk> {
        validate_inputs(text, voice_description)?;
        self.generate(text.to_string(), voice_description.to_string())
            .await
    }

    /// Generate the whole utterance and encode it as one WAV buffer.
    pub async fn synthesize_wav(&self, text: &str, voice_description: &str) -> TtsResult<Vec<u8>> {
        let audio = self.synthesize(text, voice_description).await?;
        audio_codec::encode_wav(&audio)
    }

    /// Stream one WAV buffer per sentence of the voice description.
    ///
    /// Each sentence conditions an independent invocation that speaks the
    /// full `text`. Chunks come out in sentence order. The first error ends
    /// the stream after being yielded; dropping the stream stops further
    /// sentences from starting.
    #[instrument(skip_all, fields(text_len = text.len(), description_len = voice_description.len()))]
    pub fn stream_wav(
        self: &Arc<Self>,
        text: &str,
        voice_description: &str,
    ) -> TtsResult<impl Stream<Item = TtsResult<Vec<u8>>> + Send + 'static> {
        validate_inputs(text, voice_description)?;

        let sentences = self.split_sentences(voice_description);
        let total = sentences.len();
        debug!(sentences = total, "Voice description split");

        let pipeline = Arc::clone(self);
        let text = text.to_string();
        // The body is polled after the handler returns; keep logging under its span.
        let span = Span::current();

        Ok(stream! {
            for (index, sentence) in sentences.into_iter().enumerate() {
                let chunk = match pipeline
                    .generate(text.clone(), sentence)
                    .instrument(span.clone())
                    .await
                {
                    Ok(audio) => audio_codec::encode_wav(&audio),
                    Err(e) => Err(e),
                };

                match chunk {
                    Ok(wav) => {
                        pipeline.metrics.stream_chunk();
                        span.in_scope(|| {
                            debug!(index, total, bytes = wav.len(), "Stream chunk ready")
                        });
                        yield Ok(wav);
                    }
                    Err(e) => {
                        span.in_scope(|| {
                            error!(index, total, error = %e, "Stream chunk failed")
                        });
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }

    async fn generate(&self, text: String, voice_description: String) -> TtsResult<AudioChunk> {
        let permit = self.gate.acquire().await?;
        debug!(waited_ms = permit.waited().as_millis() as u64, "Model acquired");

        let model = Arc::clone(&self.model);
        let options = self.options.clone();
        let start = Instant::now();

        let audio = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            model.lock().generate(&text, &voice_description, &options)
        })
        .await
        .map_err(|e| TtsError::internal(format!("generation task failed: {e}")))??;

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_inference_latency(elapsed_ms);
        let audio_ms = audio.duration_ms() as f64;
        if audio_ms > 0.0 {
            self.metrics.record_rtf(elapsed_ms / audio_ms);
        }
        debug!(
            elapsed_ms,
            audio_ms,
            samples = audio.num_samples(),
            "Generation finished"
        );

        Ok(audio)
    }
}
