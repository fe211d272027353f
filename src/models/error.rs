use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use serde_json::Value;
use tracing::warn;

/// Failures while loading session data or building a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("no Grand Prix matching '{name}' in {year}")]
    GrandPrixNotFound {
        year: i32,
        name: String,
        available: Vec<String>,
    },
    #[error("insufficient data to make prediction: {0}")]
    InsufficientData(String),
    #[error("unable to generate predictions")]
    NoPredictions,
    #[error("invalid session data: {0}")]
    InvalidData(String),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("request limiter closed")]
    LimiterClosed,
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PredictError {
    /// True when another Grand Prix or season might still produce a prediction.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PredictError::GrandPrixNotFound { .. }
                | PredictError::InsufficientData(_)
                | PredictError::NoPredictions
        )
    }
}

#[derive(Debug)]
pub struct Error {
    pub code: StatusCode,
    pub body: Json<Value>,
}

impl Error {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            body: Json(json!({"message": message})),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.code, self.body).into_response()
    }
}

impl From<(StatusCode, &str)> for Error {
    fn from((code, msg): (StatusCode, &str)) -> Self {
        Self::new(code, msg)
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

impl From<PredictError> for Error {
    fn from(error: PredictError) -> Self {
        let message = error.to_string();
        match error {
            PredictError::GrandPrixNotFound { available, .. } => Self {
                code: StatusCode::NOT_FOUND,
                body: Json(json!({"message": message, "available": available})),
            },
            PredictError::InsufficientData(_) | PredictError::NoPredictions => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, &message)
            }
            PredictError::InvalidData(_) | PredictError::Json(_) => {
                Self::new(StatusCode::BAD_REQUEST, &message)
            }
            PredictError::Upstream(_) | PredictError::LimiterClosed => {
                warn!("{}", message);
                Self::new(StatusCode::BAD_GATEWAY, &message)
            }
            PredictError::Io { .. } => {
                warn!("{}", message);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, &message)
            }
        }
    }
}
