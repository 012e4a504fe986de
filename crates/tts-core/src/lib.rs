//! # tts-core
//!
//! Core types, traits, and error definitions for the Parler-TTS service.
//!
//! This crate provides the foundational abstractions used across all other crates
//! in the workspace, including:
//!
//! - Request and audio data types (`GenerationRequest`, `AudioChunk`, etc.)
//! - The `SpeechModel` and `TextTokenizer` seams
//! - Unified error handling via `TtsError`
//! - Configuration structures

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    DEFAULT_MODEL_ID, LoggingConfig, ModelConfig, QueueConfig, ServerConfig, ServiceConfig,
    StreamConfig, WeightsDType,
};
pub use error::{TtsError, TtsResult};
pub use traits::{GenerationOptions, SpeechModel, TextTokenizer};
pub use types::{AudioChunk, GenerationRequest, Lang, OutputFormat};
