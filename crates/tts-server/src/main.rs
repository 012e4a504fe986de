//! Parler-TTS HTTP Server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use acoustic_model::{MockSpeechModel, ModelFiles, ParlerTts, candle_dtype};
use anyhow::{Context, Result};
use clap::Parser;
use runtime::metrics::TtsMetrics;
use runtime::{SpeechPipeline, device_name, select_device};
use text_tokenizer::SentenceSplitter;
use tracing::info;
use tts_core::{Lang, ServiceConfig, SpeechModel};

use tts_server::{AppState, TtsServer};

/// Parler-TTS HTTP Server
#[derive(Debug, Parser)]
#[command(name = "tts-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind host [default: 0.0.0.0]
    #[arg(long)]
    host: Option<String>,

    /// Bind port [default: 8593]
    #[arg(long)]
    port: Option<u16>,

    /// Force CPU inference even if a GPU is available
    #[arg(long)]
    use_cpu: bool,

    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level [default: info]
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    /// Sentence splitting language for streaming (en, ru) [default: en]
    #[arg(long)]
    lang: Option<Lang>,

    /// Serve a deterministic mock model instead of loading weights
    #[arg(long)]
    mock: bool,
}

/// How often the Prometheus recorder drains its histogram buckets.
const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

impl Args {
    /// Command-line flags take precedence over the config file.
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.use_cpu {
            config.model.use_cpu = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.format = "json".to_string();
        }
        if let Some(lang) = self.lang {
            config.stream.lang = lang;
        }
    }
}

/// Wrap a model in the pipeline configured by `config`.
fn assemble_pipeline(
    model: impl SpeechModel + 'static,
    config: &ServiceConfig,
    device: &str,
) -> SpeechPipeline {
    SpeechPipeline::new(model, config.generation.clone(), &config.queue)
        .with_splitter(SentenceSplitter::from_config(&config.stream))
        .with_device_name(device)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    runtime::logging::init_logging_from_config(&config.logging)
        .context("Invalid logging configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.bind_addr(),
        mock = args.mock,
        "Starting Parler-TTS server"
    );

    let prometheus = if config.server.metrics_enabled {
        let handle = TtsMetrics::install().context("Failed to install metrics recorder")?;
        TtsMetrics::spawn_upkeep(handle.clone(), METRICS_UPKEEP_INTERVAL);
        Some(handle)
    } else {
        None
    };

    let device = select_device(config.model.use_cpu);
    let device_label = device_name(&device);
    let pipeline = if args.mock {
        assemble_pipeline(MockSpeechModel::new(), &config, device_label)
    } else {
        let files = ModelFiles::resolve(&config.model)
            .await
            .context("Failed to resolve model files")?;
        let name = config
            .model
            .model_dir
            .as_ref()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.model.model_id.clone());
        let dtype = candle_dtype(config.model.dtype);

        let load_device = device.clone();
        let model = tokio::task::spawn_blocking(move || {
            ParlerTts::load(&files, &name, &load_device, dtype)
        })
        .await
        .context("Model loading task failed")?
        .context("Failed to load model")?;

        assemble_pipeline(model, &config, device_label)
    };

    let mut state = AppState::new(Arc::new(pipeline));
    if let Some(handle) = prometheus {
        state = state.with_prometheus(handle);
    }

    TtsServer::new(config.server, state)
        .run()
        .await
        .context("Server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_config() {
        let args = Args::parse_from(["tts-server"]);
        let mut config = ServiceConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.bind_addr(), "0.0.0.0:8593");
        assert!(!config.model.use_cpu);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.stream.lang, Lang::En);
        assert!(!args.mock);
    }

    #[test]
    fn test_lang_flag_overrides_config() {
        let args = Args::parse_from(["tts-server", "--lang", "russian"]);
        let mut config = ServiceConfig::default();
        args.apply(&mut config);
        assert_eq!(config.stream.lang, Lang::Ru);

        assert!(Args::try_parse_from(["tts-server", "--lang", "klingon"]).is_err());
    }

    #[test]
    fn test_pipeline_uses_stream_config() {
        let description = "Живёт на ул. Ленина. Говорит тихо.";

        let english = assemble_pipeline(MockSpeechModel::new(), &ServiceConfig::default(), "cpu");
        assert_eq!(english.split_sentences(description).len(), 3);

        let config = ServiceConfig::from_json(
            r#"{"stream": {"lang": "ru", "abbreviations": ["Capt."]}}"#,
        )
        .unwrap();
        let russian = assemble_pipeline(MockSpeechModel::new(), &config, "metal");
        assert_eq!(russian.device_name(), "metal");
        assert_eq!(
            russian.split_sentences(description),
            vec!["Живёт на ул. Ленина.", "Говорит тихо."]
        );
        assert_eq!(russian.split_sentences("Capt. Hook hums.").len(), 1);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "tts-server",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--use-cpu",
            "--log-level",
            "debug",
            "--json-logs",
        ]);
        let mut config = ServiceConfig::from_json(r#"{"server": {"port": 7000}}"#).unwrap();
        args.apply(&mut config);

        assert_eq!(config.server.bind_addr(), "127.0.0.1:9000");
        assert!(config.model.use_cpu);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }
}
