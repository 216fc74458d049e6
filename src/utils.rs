use std::path::Path;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::{config::Config, error::AppError};

async fn download_file(url: &str, path: &Path, token: Option<&str>) -> Result<(), AppError> {
    log::info!("Downloading {} from {}", path.display(), url);

    let mut header_map = HeaderMap::new();
    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                header_map.insert(AUTHORIZATION, value);
            }
            Err(_) => log::warn!("GITHUB_TOKEN is not a valid header value, downloading without it"),
        }
    }
    header_map.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

    let client = reqwest::Client::new();
    let response = client.get(url).headers(header_map).send().await?;

    if !response.status().is_success() {
        return Err(AppError::DownloadStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let bytes = response.bytes().await?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes).await?;
    log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Makes sure the model artifact is on disk, fetching it from `MODEL_URL`
/// when it is not.
pub async fn ensure_model_exists(config: &Config) -> Result<(), AppError> {
    log::info!("Checking model at {}", config.model_path.display());
    if config.model_path.exists() {
        return Ok(());
    }

    match config.model_url.as_deref() {
        Some(url) => {
            download_file(url, &config.model_path, config.github_token.as_deref()).await
        }
        None => Err(AppError::ModelMissing(
            config.model_path.display().to_string(),
        )),
    }
}
