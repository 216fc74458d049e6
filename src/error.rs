use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Failures that stop the service from starting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model file {0} not found and MODEL_URL is not set")]
    ModelMissing(String),
    #[error("failed to download model: {0}")]
    Download(#[from] reqwest::Error),
    #[error("failed to download model from {url}: HTTP {status}")]
    DownloadStatus { url: String, status: u16 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("tensorflow: {0}")]
    Tensorflow(#[from] tensorflow::Status),
    #[error("operation '{0}' not found in model graph")]
    MissingOperation(String),
    #[error("server error: {0}")]
    Server(#[from] hyper::Error),
}

/// Failures while turning one upload into a prediction. These never leave the
/// request handler; they become `label: "Error"` entries.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Decode(#[from] image::ImageError),
    #[error("inference failed: {0}")]
    Inference(#[from] tensorflow::Status),
    #[error("model returned an empty prediction")]
    EmptyPrediction,
}

/// Request-level failures, rendered as `{"error": ...}` with status 400.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No files part in request")]
    NoFiles,
    #[error(transparent)]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
