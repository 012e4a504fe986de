//! HTTP error responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};
use tts_core::TtsError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
    kind: &'a str,
}

/// An error rendered as `{"detail": ..., "kind": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

/// HTTP status for a service error.
pub fn status_for(err: &TtsError) -> StatusCode {
    match err {
        TtsError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TtsError::Tokenization(_) => StatusCode::BAD_REQUEST,
        TtsError::ResourceExhausted(_) | TtsError::Timeout { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        TtsError::Inference(_)
        | TtsError::AudioEncode(_)
        | TtsError::ModelLoad { .. }
        | TtsError::Config(_)
        | TtsError::Io(_)
        | TtsError::Serialization(_)
        | TtsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TtsError> for ApiError {
    fn from(err: TtsError) -> Self {
        Self::new(status_for(&err), err.kind(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, "invalid_input", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_input",
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, kind = self.kind, detail = %self.detail, "Request failed");
        } else {
            warn!(status = %self.status, kind = self.kind, detail = %self.detail, "Request rejected");
        }

        let body = Json(ErrorBody {
            detail: &self.detail,
            kind: self.kind,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&TtsError::invalid_input("blank")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&TtsError::tokenization("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&TtsError::inference("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&TtsError::resource_exhausted("full")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&TtsError::Timeout { ms: 5 }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_from_tts_error_keeps_kind() {
        let err = ApiError::from(TtsError::resource_exhausted("queue full"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.kind(), "overloaded");
        assert!(err.detail.contains("queue full"));
    }
}
