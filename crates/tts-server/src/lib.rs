//! # tts-server
//!
//! HTTP server for Parler-TTS.
//!
//! Provides:
//! - `POST /generate_speech`: whole-utterance synthesis (base64 JSON or WAV)
//! - `POST /generate_speech_stream`: sentence-chunked streaming synthesis
//! - `GET /health` and a Prometheus `GET /metrics` endpoint

pub mod error;
pub mod server;
pub mod service;

pub use error::ApiError;
pub use server::{AppState, TtsServer, build_router};
