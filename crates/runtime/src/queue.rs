//! Inference gate: single-flight access to the model with a bounded,
//! time-limited waiting queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};
use tts_core::{QueueConfig, TtsError, TtsResult};

use crate::metrics::TtsMetrics;

/// Exclusive right to run one generation.
///
/// The model becomes available to the next caller when this is dropped.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    waited: Duration,
}

impl GatePermit {
    /// Time spent waiting in the queue.
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

/// Serializes model invocations.
#[derive(Debug)]
pub struct InferenceGate {
    semaphore: Arc<Semaphore>,
    waiting: AtomicUsize,
    max_pending: usize,
    timeout: Duration,
    metrics: TtsMetrics,
}

/// Releases a waiting slot even if the acquiring future is dropped.
struct WaitingSlot<'a> {
    gate: &'a InferenceGate,
}

impl Drop for WaitingSlot<'_> {
    fn drop(&mut self) {
        let now = self.gate.waiting.fetch_sub(1, Ordering::SeqCst) - 1;
        self.gate.metrics.set_queue_waiting(now);
    }
}

impl InferenceGate {
    /// Create a gate from the queue configuration.
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            waiting: AtomicUsize::new(0),
            max_pending: config.max_pending,
            timeout: Duration::from_millis(config.timeout_ms),
            metrics: TtsMetrics,
        }
    }

    /// Wait for the model.
    ///
    /// Fails with `ResourceExhausted` when `max_pending` callers are already
    /// waiting, and with `Timeout` when the wait exceeds the queue timeout.
    pub async fn acquire(&self) -> TtsResult<GatePermit> {
        let start = Instant::now();

        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            return Ok(GatePermit {
                _permit: permit,
                waited: Duration::ZERO,
            });
        }

        let _slot = self.reserve_slot()?;
        debug!(waiting = self.waiting(), "Model busy, queued");

        match tokio::time::timeout(self.timeout, Arc::clone(&self.semaphore).acquire_owned()).await
        {
            Ok(Ok(permit)) => Ok(GatePermit {
                _permit: permit,
                waited: start.elapsed(),
            }),
            Ok(Err(_)) => Err(TtsError::internal("inference gate closed")),
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                warn!(timeout_ms = ms, "Timed out waiting for the model");
                Err(TtsError::Timeout { ms })
            }
        }
    }

    fn reserve_slot(&self) -> TtsResult<WaitingSlot<'_>> {
        let reserved = self
            .waiting
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_pending).then_some(n + 1)
            });

        match reserved {
            Ok(previous) => {
                self.metrics.set_queue_waiting(previous + 1);
                Ok(WaitingSlot { gate: self })
            }
            Err(_) => {
                warn!(max_pending = self.max_pending, "Inference queue full");
                Err(TtsError::resource_exhausted(format!(
                    "inference queue is full ({} waiting)",
                    self.max_pending
                )))
            }
        }
    }

    /// Number of callers currently waiting.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Whether a generation is running right now.
    pub fn is_busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}
