//! Structured logging setup with tracing.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};
use tts_core::{LoggingConfig, TtsError, TtsResult};

/// Logging format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// JSON format for structured logging.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(TtsError::config(format!("unknown log format: {s}"))),
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Returns `false` when a
/// subscriber was already installed, in which case nothing changes.
pub fn init_logging(level: &str, format: LogFormat) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
    };
    installed.is_ok()
}

/// Initialize logging from the `logging` section of the service config.
pub fn init_logging_from_config(config: &LoggingConfig) -> TtsResult<()> {
    let format: LogFormat = config.format.parse()?;
    if !init_logging(&config.level, format) {
        tracing::debug!("Global subscriber already installed");
    }
    Ok(())
}
