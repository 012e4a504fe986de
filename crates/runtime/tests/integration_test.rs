//! Integration tests for the speech pipeline.
//!
//! These drive the pipeline with the mock model to check the inference
//! gate and sentence-chunked streaming end to end.

use std::sync::Arc;
use std::time::Duration;

use acoustic_model::MockSpeechModel;
use futures::StreamExt;
use runtime::SpeechPipeline;
use tts_core::{GenerationOptions, QueueConfig, TtsError};

fn pipeline(model: MockSpeechModel, max_pending: usize, timeout_ms: u64) -> Arc<SpeechPipeline> {
    Arc::new(SpeechPipeline::new(
        model,
        GenerationOptions::default(),
        &QueueConfig {
            max_pending,
            timeout_ms,
        },
    ))
}

async fn wait_until_busy(pipeline: &SpeechPipeline) {
    while !pipeline.gate().is_busy() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Test full pipeline: text + description → audio in a WAV container.
#[tokio::test]
async fn test_synthesize_structural_output() {
    let model = MockSpeechModel::new();
    let p = pipeline(model.clone(), 4, 10_000);

    let audio = p.synthesize("Hello world", "calm voice").await.unwrap();
    assert_eq!(audio.sample_rate, 44_100);
    assert_eq!(audio.num_samples(), model.expected_samples("calm voice"));
    for &sample in audio.pcm.iter() {
        assert!((-1.0..=1.0).contains(&sample));
    }

    let wav = p.synthesize_wav("Hello world", "calm voice").await.unwrap();
    assert!(audio_codec::has_wav_header(&wav));
    let (decoded, rate) = audio_codec::decode_wav(&wav).unwrap();
    assert_eq!(rate, 44_100);
    assert_eq!(decoded.len(), audio.num_samples());
}

/// Chunks follow sentence order, one per sentence.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stream_order_matches_sentences() {
    let model = MockSpeechModel::new();
    let p = pipeline(model.clone(), 4, 10_000);

    let description = "A deep voice. Fast. A very slow and quiet female voice!";
    let sentences = p.split_sentences(description);
    assert_eq!(sentences.len(), 3);

    let chunks: Vec<Vec<u8>> = p
        .stream_wav("Hello there", description)
        .unwrap()
        .map(|c| c.unwrap())
        .collect()
        .await;

    assert_eq!(chunks.len(), sentences.len());
    for (chunk, sentence) in chunks.iter().zip(&sentences) {
        let (samples, _) = audio_codec::decode_wav(chunk).unwrap();
        assert_eq!(samples.len(), model.expected_samples(sentence));
    }
}

/// A failing sentence ends the stream after the chunks already produced.
#[tokio::test]
async fn test_stream_stops_at_first_failure() {
    let model = MockSpeechModel::new().fail_on("broken");
    let p = pipeline(model.clone(), 4, 10_000);

    let items: Vec<_> = p
        .stream_wav("Hello", "Calm voice. Broken voice. Never reached.")
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(TtsError::Inference(_))));
    assert_eq!(model.calls(), 2);
}

/// Dropping the stream stops further sentences from starting.
#[tokio::test]
async fn test_dropped_stream_starts_no_more_sentences() {
    let model = MockSpeechModel::new();
    let p = pipeline(model.clone(), 4, 10_000);

    let mut stream = Box::pin(p.stream_wav("Hello", "One. Two. Three.").unwrap());
    assert!(stream.next().await.unwrap().is_ok());
    drop(stream);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(model.calls(), 1);
    assert!(!p.gate().is_busy());
}

/// Only one generation runs at a time; a full queue is rejected.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_queue_is_rejected() {
    let model = MockSpeechModel::new().with_delay(Duration::from_millis(300));
    let p = pipeline(model, 0, 10_000);

    let running = {
        let p = Arc::clone(&p);
        tokio::spawn(async move { p.synthesize("Hello", "calm").await })
    };
    wait_until_busy(&p).await;

    let err = p.synthesize("Hello", "calm").await.unwrap_err();
    assert!(matches!(err, TtsError::ResourceExhausted(_)));
    assert_eq!(err.kind(), "overloaded");

    assert!(running.await.unwrap().is_ok());
}

/// Waiting longer than the queue timeout fails without touching the model.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queue_timeout() {
    let model = MockSpeechModel::new().with_delay(Duration::from_millis(400));
    let p = pipeline(model.clone(), 4, 50);

    let running = {
        let p = Arc::clone(&p);
        tokio::spawn(async move { p.synthesize("Hello", "calm").await })
    };
    wait_until_busy(&p).await;

    let err = p.synthesize("Hello", "calm").await.unwrap_err();
    assert!(matches!(err, TtsError::Timeout { ms: 50 }));

    assert!(running.await.unwrap().is_ok());
    assert_eq!(model.calls(), 1);
}

/// Queued requests run one after another once the model frees up.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queued_requests_complete() {
    let model = MockSpeechModel::new().with_delay(Duration::from_millis(20));
    let p = pipeline(model.clone(), 8, 10_000);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let p = Arc::clone(&p);
            tokio::spawn(async move { p.synthesize("Hello", &format!("voice {i}")).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(model.calls(), 4);
    assert_eq!(p.gate().waiting(), 0);
}
