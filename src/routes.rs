use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::ApiError,
    model::Classifier,
    prediction::{predict_file, PredictionResult, UploadedFile},
};

const FILES_FIELD: &str = "files";

pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
}

pub fn router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/multi_predict", post(multi_predict))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(state)
        .route("/favicon.ico", get(favicon))
        .route("/health", get(health_check))
        .layer(cors)
}

async fn multi_predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<PredictionResult>>, ApiError> {
    // A body that is not multipart at all carries no files part either.
    let mut multipart = multipart.map_err(|_| ApiError::NoFiles)?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        // Text fields share the name space with file parts; only parts with a
        // filename are uploads.
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let bytes = field.bytes().await?.to_vec();
        files.push(UploadedFile { filename, bytes });
    }

    if files.is_empty() {
        return Err(ApiError::NoFiles);
    }

    log::info!("Classifying {} uploaded file(s)", files.len());
    // Inference is CPU-bound; run the whole batch, still in order, off the
    // async workers.
    let classifier = Arc::clone(&state.classifier);
    let results: Vec<PredictionResult> = tokio::task::spawn_blocking(move || {
        files
            .into_iter()
            .map(|file| predict_file(classifier.as_ref(), file))
            .collect::<Vec<_>>()
    })
    .await
    .unwrap_or_else(|e| std::panic::resume_unwind(e.into_panic()));

    for result in &results {
        log::debug!("{} -> {:?}", result.filename(), result.label());
    }

    Ok(Json(results))
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}
