//! # runtime
//!
//! Runtime orchestration for the Parler-TTS service.
//!
//! This crate provides:
//! - The inference gate: single-flight, bounded, time-limited access to the model
//! - The speech pipeline: validation, generation on the blocking pool, WAV
//!   encoding and sentence-chunked streaming
//! - Structured logging and metrics
//! - Device selection (CPU/GPU)

pub mod device;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod queue;

pub use device::{device_name, select_device};
pub use pipeline::SpeechPipeline;
pub use queue::{GatePermit, InferenceGate};
