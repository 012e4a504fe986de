//! Metrics collection and Prometheus export.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tts_core::{TtsError, TtsResult};

/// Metrics recorder for TTS operations.
///
/// Without an installed recorder every call is a no-op, which keeps tests
/// and the library usable on their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtsMetrics;

impl TtsMetrics {
    /// Install the global Prometheus recorder and register descriptions.
    ///
    /// The returned handle renders the text exposition for `/metrics`.
    /// Pair it with [`TtsMetrics::spawn_upkeep`]: without an exporter task
    /// nothing drains histogram buckets between scrapes.
    pub fn install() -> TtsResult<PrometheusHandle> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| TtsError::internal(format!("metrics init failed: {e}")))?;

        Self::register_metrics();
        Ok(handle)
    }

    /// Run recorder upkeep every `period` on the current tokio runtime.
    pub fn spawn_upkeep(handle: PrometheusHandle, period: Duration) -> JoinHandle<()> {
        debug!(period_ms = period.as_millis() as u64, "Metrics upkeep started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                handle.run_upkeep();
            }
        })
    }

    fn register_metrics() {
        describe_counter!(
            "tts_requests_total",
            "Total number of TTS requests received"
        );
        describe_counter!(
            "tts_requests_failed",
            "Total number of TTS requests that failed"
        );
        describe_counter!(
            "tts_stream_chunks_total",
            "Total number of audio chunks emitted by streaming requests"
        );
        describe_histogram!(
            "tts_inference_latency_ms",
            "Model inference latency in milliseconds"
        );
        describe_histogram!(
            "tts_rtf",
            "Real-time factor (processing time / audio duration)"
        );
        describe_gauge!(
            "tts_queue_waiting",
            "Number of requests waiting for the inference gate"
        );
    }

    /// Record a new request received.
    pub fn request_received(&self, endpoint: &'static str) {
        counter!("tts_requests_total", "endpoint" => endpoint).increment(1);
    }

    /// Record a request failed.
    pub fn request_failed(&self, endpoint: &'static str, kind: &'static str) {
        counter!("tts_requests_failed", "endpoint" => endpoint, "kind" => kind).increment(1);
    }

    /// Record one emitted stream chunk.
    pub fn stream_chunk(&self) {
        counter!("tts_stream_chunks_total").increment(1);
    }

    /// Record inference latency.
    pub fn record_inference_latency(&self, ms: f64) {
        histogram!("tts_inference_latency_ms").record(ms);
    }

    /// Record real-time factor.
    pub fn record_rtf(&self, rtf: f64) {
        histogram!("tts_rtf").record(rtf);
    }

    /// Set the number of callers waiting for the model.
    pub fn set_queue_waiting(&self, waiting: usize) {
        gauge!("tts_queue_waiting").set(waiting as f64);
    }
}
