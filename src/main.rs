use std::sync::Arc;

mod config;
mod error;
mod model;
mod prediction;
mod preprocess;
mod routes;
#[cfg(test)]
mod testutil;
mod utils;

use config::Config;
use error::AppError;
use model::TfModel;
use routes::{router, AppState};
use utils::ensure_model_exists;

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let code = exit_code(&run().await);
    if code != 0 {
        std::process::exit(code);
    }
}

/// Logs a startup failure once and maps it to the process exit status.
fn exit_code(result: &Result<(), AppError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e);
            1
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    ensure_model_exists(&config).await?;

    log::info!("Loading model from {}", config.model_path.display());
    let model = TfModel::load(&config.model_path, &config.input_op, &config.output_op)?;
    let shared_state = Arc::new(AppState {
        classifier: Arc::new(model),
    });

    let app = router(shared_state, config.body_limit_bytes());

    let addr = config.bind_addr();
    log::info!("Listening on http://{}", addr);
    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failure_exits_non_zero() {
        let missing = Err(AppError::ModelMissing("./model/final_model.pb".into()));
        assert_eq!(exit_code(&missing), 1);
        assert_eq!(exit_code(&Ok(())), 0);
    }
}
