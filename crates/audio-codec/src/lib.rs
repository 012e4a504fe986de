//! # audio-codec
//!
//! WAV container handling for generated speech.
//!
//! Waveforms never touch the filesystem: each model output is written into
//! an in-memory buffer and handed straight to the HTTP layer.

pub mod wav;

pub use wav::{WAV_HEADER_LEN, decode_wav, encode_wav, encode_wav_samples, has_wav_header};
