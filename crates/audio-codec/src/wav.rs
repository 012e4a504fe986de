//! WAV encoding to and from memory buffers.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::trace;
use tts_core::{AudioChunk, TtsError, TtsResult};

/// Size of the canonical RIFF/WAVE header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Encode an audio chunk as a mono 16-bit PCM WAV file.
pub fn encode_wav(chunk: &AudioChunk) -> TtsResult<Vec<u8>> {
    encode_wav_samples(&chunk.pcm, chunk.sample_rate)
}

/// Encode raw samples as a mono 16-bit PCM WAV file.
///
/// Samples outside `[-1, 1]` are clamped. An empty slice produces a valid
/// header-only file.
pub fn encode_wav_samples(samples: &[f32], sample_rate: u32) -> TtsResult<Vec<u8>> {
    if sample_rate == 0 {
        return Err(TtsError::audio_encode("sample rate must be > 0"));
    }

    let mut buffer = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut buffer, pcm16_spec(sample_rate))
            .map_err(|e| TtsError::audio_encode(e.to_string()))?;

        for &sample in samples {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| TtsError::audio_encode(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| TtsError::audio_encode(e.to_string()))?;
    }

    let bytes = buffer.into_inner();
    trace!(samples = samples.len(), bytes = bytes.len(), "WAV encoded");
    Ok(bytes)
}

/// Read a WAV buffer back into normalized f32 samples and its sample rate.
pub fn decode_wav(bytes: &[u8]) -> TtsResult<(Vec<f32>, u32)> {
    let mut reader =
        WavReader::new(Cursor::new(bytes)).map_err(|e| TtsError::audio_encode(e.to_string()))?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| TtsError::audio_encode(e.to_string()))?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TtsError::audio_encode(e.to_string()))?,
    };

    Ok((samples, spec.sample_rate))
}

/// Check for the `RIFF....WAVE` signature.
pub fn has_wav_header(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}
