//! Mapping of generation options onto candle's logits processor.

use candle_transformers::generation::{LogitsProcessor, Sampling};
use tts_core::GenerationOptions;

/// Choose a candle sampling strategy for the given options.
///
/// A non-positive temperature means greedy decoding. `top_k == 0` and
/// `top_p >= 1.0` disable the respective filters.
pub fn sampling_strategy(options: &GenerationOptions) -> Sampling {
    let temperature = options.temperature;
    if temperature <= f64::EPSILON {
        return Sampling::ArgMax;
    }

    let top_k = (options.top_k > 0).then_some(options.top_k);
    let top_p = (options.top_p < 1.0).then_some(options.top_p);

    match (top_k, top_p) {
        (None, None) => Sampling::All { temperature },
        (Some(k), None) => Sampling::TopK { k, temperature },
        (None, Some(p)) => Sampling::TopP { p, temperature },
        (Some(k), Some(p)) => Sampling::TopKThenTopP { k, p, temperature },
    }
}

/// Build a logits processor, seeding it randomly when no seed is set.
pub fn logits_processor(options: &GenerationOptions) -> LogitsProcessor {
    let seed = options.seed.unwrap_or_else(rand::random);
    LogitsProcessor::from_sampling(seed, sampling_strategy(options))
}
