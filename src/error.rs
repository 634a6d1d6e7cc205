// ABOUTME: Application-wide error types for fleetroll.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("handler reported failure: {0}")]
    HandlerFailed(String),

    #[error("{0}")]
    Deploy(#[from] crate::deploy::DeployError),

    #[error("{0}")]
    Responder(#[from] crate::resource::ResponderError),

    #[error("{0}")]
    Pipeline(#[from] crate::cloud::PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
