use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error taxonomy for one TaleWeaver run. Every variant aborts the current
/// run; nothing is retried internally. The serialized form is what the UI
/// receives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TaleError {
    /// The completion API returned text that does not parse into the
    /// expected three-part narrative shape.
    #[error("narrative response was malformed: {0}")]
    MalformedNarrative(String),

    /// The remote video job reported `failed`, carrying its reason.
    #[error("video generation failed: {0}")]
    GenerationFailed(String),

    /// The remote video job never reached a terminal state within the
    /// configured bound (seconds).
    #[error("video generation did not finish within {0}s")]
    GenerationTimeout(u64),

    #[error("asset download failed: {0}")]
    Download(String),

    /// The join step could not read or write a clip.
    #[error("clip encoding failed: {0}")]
    Encoding(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TaleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TaleError::MalformedNarrative(_)
            | TaleError::GenerationFailed(_)
            | TaleError::Download(_)
            | TaleError::Network(_) => StatusCode::BAD_GATEWAY,
            TaleError::GenerationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            TaleError::Encoding(_) | TaleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TaleError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
