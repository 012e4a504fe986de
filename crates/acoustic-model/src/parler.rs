//! Parler-TTS model wrapper.

use std::collections::HashMap;
use std::time::Instant;

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::parler_tts::{Config, Model};
use text_tokenizer::Tokenizer;
use tracing::{debug, info, instrument};
use tts_core::{
    AudioChunk, GenerationOptions, SpeechModel, TextTokenizer, TtsError, TtsResult, WeightsDType,
};

use crate::loader::ModelFiles;
use crate::sampling::logits_processor;

/// Convert a candle error into an inference error.
fn inference_err(e: candle_core::Error) -> TtsError {
    TtsError::inference(e.to_string())
}

/// Map the configured weights dtype onto candle's.
pub fn candle_dtype(dtype: WeightsDType) -> DType {
    match dtype {
        WeightsDType::F32 => DType::F32,
        WeightsDType::F16 => DType::F16,
        WeightsDType::Bf16 => DType::BF16,
    }
}

/// A loaded Parler-TTS checkpoint with its tokenizer.
///
/// The voice description conditions the text encoder; the text to speak is
/// fed as the decoder prompt.
pub struct ParlerTts {
    model: Model,
    tokenizer: Tokenizer,
    device: Device,
    sample_rate: u32,
    name: String,
}

impl std::fmt::Debug for ParlerTts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParlerTts")
            .field("name", &self.name)
            .field("device", &self.device)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl ParlerTts {
    /// Load weights, config and tokenizer onto `device`.
    #[instrument(skip(files, device), fields(shards = files.weights.len()))]
    pub fn load(
        files: &ModelFiles,
        name: &str,
        device: &Device,
        dtype: DType,
    ) -> TtsResult<Self> {
        let start = Instant::now();

        let config_json = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&config_json)
            .map_err(|e| TtsError::model_load(&files.config, e.to_string()))?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)?;

        let mut tensors = HashMap::new();
        for shard in &files.weights {
            debug!(shard = %shard.display(), "Loading weights shard");
            let shard_tensors = candle_core::safetensors::load(shard, device)
                .map_err(|e| TtsError::model_load(shard, e.to_string()))?;
            tensors.extend(shard_tensors);
        }

        let vb = VarBuilder::from_tensors(tensors, dtype, device);
        let model = Model::new(&config, vb)
            .map_err(|e| TtsError::model_load(&files.config, e.to_string()))?;

        let sample_rate = config.audio_encoder.sampling_rate;
        info!(
            name,
            sample_rate,
            ?dtype,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Parler-TTS model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
            sample_rate,
            name: name.to_string(),
        })
    }

    fn token_tensor(&self, ids: &[u32]) -> TtsResult<Tensor> {
        Tensor::new(ids, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference_err)
    }
}

impl SpeechModel for ParlerTts {
    #[instrument(skip_all, fields(text_len = text.len(), description_len = voice_description.len()))]
    fn generate(
        &mut self,
        text: &str,
        voice_description: &str,
        options: &GenerationOptions,
    ) -> TtsResult<AudioChunk> {
        let description_ids = self.tokenizer.encode(voice_description)?;
        let prompt_ids = self.tokenizer.encode(text)?;
        debug!(
            description_tokens = description_ids.len(),
            prompt_tokens = prompt_ids.len(),
            "Tokenized inputs"
        );

        let description_tokens = self.token_tensor(&description_ids)?;
        let prompt_tokens = self.token_tensor(&prompt_ids)?;

        let start = Instant::now();
        let codes = self
            .model
            .generate(
                &prompt_tokens,
                &description_tokens,
                logits_processor(options),
                options.max_tokens,
            )
            .map_err(inference_err)?;
        debug!(
            codes = ?codes.dims(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Audio codes generated"
        );

        let codes = codes
            .to_dtype(DType::I64)
            .and_then(|c| c.unsqueeze(0))
            .map_err(inference_err)?;
        let pcm = self
            .model
            .audio_encoder
            .decode_codes(&codes)
            .and_then(|pcm| pcm.i((0, 0)))
            .and_then(|pcm| pcm.to_dtype(DType::F32))
            .and_then(|pcm| pcm.to_vec1::<f32>())
            .map_err(inference_err)?;

        Ok(AudioChunk::new(pcm, self.sample_rate))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        &self.name
    }
}
