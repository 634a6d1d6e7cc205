// ABOUTME: Key-value parameter store trait.
// ABOUTME: Reads parameters and writes them with overwrite semantics.

use async_trait::async_trait;

/// A key-value parameter store read by the stack deploy stage.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Read a parameter value.
    async fn get_parameter(&self, name: &str) -> Result<String, ParameterError>;

    /// Write a parameter. With `overwrite`, an existing value is replaced.
    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), ParameterError>;
}

/// Errors from the parameter store.
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    #[error("parameter not found: {0}")]
    NotFound(String),

    #[error("parameter already exists: {0}")]
    AlreadyExists(String),

    #[error("parameter request throttled: {0}")]
    Throttled(String),

    #[error("parameter store error: {0}")]
    Service(String),
}
