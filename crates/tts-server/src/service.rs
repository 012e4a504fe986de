//! Request handlers for the speech API.

use std::sync::Arc;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span};
use tts_core::{GenerationRequest, OutputFormat, TtsError};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;

const GENERATE_ENDPOINT: &str = "generate_speech";
const STREAM_ENDPOINT: &str = "generate_speech_stream";

/// Body of a base64 response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioResponse {
    pub audio: String,
}

/// Query string accepted by the streaming endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(default, alias = "outputFormat")]
    pub output_format: Option<OutputFormat>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub device: String,
    pub uptime_secs: u64,
}

/// `GET /`
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Welcome to the Parler-TTS API" }))
}

/// `POST /generate_speech`: one model invocation, one WAV.
pub async fn generate_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.metrics.request_received(GENERATE_ENDPOINT);
    let span = info_span!("generate_speech", request_id = %Uuid::new_v4());

    let result = async {
        let Json(request) = payload?;
        let format = request.format();
        debug!(%format, text_len = request.text.len(), "Request accepted");

        let wav = state
            .pipeline
            .synthesize_wav(&request.text, &request.voice_description)
            .await?;
        info!(bytes = wav.len(), %format, "Speech generated");

        Ok::<_, ApiError>(match format {
            OutputFormat::Base64 => Json(AudioResponse {
                audio: STANDARD.encode(&wav),
            })
            .into_response(),
            OutputFormat::Wav => ([(header::CONTENT_TYPE, "audio/wav")], wav).into_response(),
        })
    }
    .instrument(span)
    .await;

    track_failure(&state, GENERATE_ENDPOINT, result)
}

/// `POST /generate_speech_stream`: one WAV per sentence of the voice
/// description, emitted as soon as each is ready.
///
/// The first sentence is generated before the response starts, so its
/// failure is an ordinary error response. Later failures abort the body.
pub async fn generate_speech_stream(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StreamQuery>, QueryRejection>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.metrics.request_received(STREAM_ENDPOINT);
    let span = info_span!("generate_speech_stream", request_id = %Uuid::new_v4());

    let result = async {
        let Query(query) = query?;
        let Json(request) = payload?;
        let format = query.output_format.unwrap_or_else(|| request.format());

        let mut chunks = Box::pin(
            state
                .pipeline
                .stream_wav(&request.text, &request.voice_description)?,
        );
        let first = chunks
            .next()
            .await
            .unwrap_or_else(|| Err(TtsError::internal("voice description has no sentences")))?;
        info!(%format, bytes = first.len(), "First stream chunk ready");

        let metrics = state.metrics;
        let body = futures::stream::once(futures::future::ready(Ok(first)))
            .chain(chunks)
            .map(move |chunk| match chunk {
                Ok(wav) => Ok(encode_chunk(format, wav)),
                Err(e) => {
                    metrics.request_failed(STREAM_ENDPOINT, e.kind());
                    Err(e)
                }
            });

        let content_type = match format {
            OutputFormat::Base64 => "text/plain; charset=utf-8",
            OutputFormat::Wav => "audio/wav",
        };
        Ok::<_, ApiError>(
            ([(header::CONTENT_TYPE, content_type)], Body::from_stream(body)).into_response(),
        )
    }
    .instrument(span)
    .await;

    track_failure(&state, STREAM_ENDPOINT, result)
}

fn encode_chunk(format: OutputFormat, wav: Vec<u8>) -> Bytes {
    match format {
        OutputFormat::Base64 => {
            let mut line = STANDARD.encode(&wav);
            line.push('\n');
            Bytes::from(line)
        }
        OutputFormat::Wav => Bytes::from(wav),
    }
}

fn track_failure(
    state: &AppState,
    endpoint: &'static str,
    result: Result<Response, ApiError>,
) -> Result<Response, ApiError> {
    if let Err(err) = &result {
        state.metrics.request_failed(endpoint, err.kind());
    }
    result
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.pipeline.model_name().to_string(),
        device: state.pipeline.device_name().to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

/// `GET /metrics` (Prometheus text format)
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    match &state.prometheus {
        Some(handle) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response()),
        None => Err(ApiError::not_found("metrics are disabled")),
    }
}

/// Fallback for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Invalid URL ({} {})", method, uri.path()))
}
