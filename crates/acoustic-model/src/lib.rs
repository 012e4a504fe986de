//! # acoustic-model
//!
//! Parler-TTS acoustic model for the speech service.
//!
//! The network itself (T5 description encoder, audio-token decoder and DAC
//! codec) comes from `candle_transformers::models::parler_tts`. This crate
//! provides:
//! - Checkpoint resolution from a local directory or the HuggingFace Hub
//! - Weight loading onto a candle `Device`
//! - The [`ParlerTts`] implementation of `tts_core::SpeechModel`
//! - Mapping of `GenerationOptions` onto candle's logits processor
//! - A deterministic [`MockSpeechModel`] for running without weights
//!
//! # Example
//!
//! ```ignore
//! use acoustic_model::{ModelFiles, ParlerTts};
//! use candle_core::{DType, Device};
//! use tts_core::{GenerationOptions, SpeechModel};
//!
//! let files = ModelFiles::from_dir("models/parler-tts-mini-v1")?;
//! let mut model = ParlerTts::load(&files, "parler-tts-mini-v1", &Device::Cpu, DType::F32)?;
//! let audio = model.generate("Hello world", "A calm female voice.", &GenerationOptions::default())?;
//! ```

pub mod loader;
pub mod mock;
pub mod parler;
pub mod sampling;

pub use loader::ModelFiles;
pub use mock::MockSpeechModel;
pub use parler::{ParlerTts, candle_dtype};
pub use sampling::{logits_processor, sampling_strategy};
