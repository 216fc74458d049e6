use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BODY_LIMIT_MB: usize = 16;
const DEFAULT_MODEL_PATH: &str = "./model/final_model.pb";
const DEFAULT_INPUT_OP: &str = "x";
const DEFAULT_OUTPUT_OP: &str = "Identity";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub body_limit_mb: usize,
    pub model_path: PathBuf,
    pub input_op: String,
    pub output_op: String,
    pub model_url: Option<String>,
    pub github_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: parse_or(
                "PORT",
                var("PORT"),
                DEFAULT_PORT,
                "a valid number between 0 and 65535",
            )?,
            body_limit_mb: parse_or(
                "BODY_LIMIT_MB",
                var("BODY_LIMIT_MB"),
                DEFAULT_BODY_LIMIT_MB,
                "a valid integer",
            )?,
            model_path: var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            input_op: var("MODEL_INPUT_OP").unwrap_or_else(|| DEFAULT_INPUT_OP.into()),
            output_op: var("MODEL_OUTPUT_OP").unwrap_or_else(|| DEFAULT_OUTPUT_OP.into()),
            model_url: var("MODEL_URL"),
            github_token: var("GITHUB_TOKEN"),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}
