// ABOUTME: Stack orchestration engine trait.
// ABOUTME: Stack outputs, current template body, and resource signals.

use super::shared_types::ResourceSignal;
use async_trait::async_trait;
use std::collections::HashMap;

/// Operations against the stack orchestration engine.
#[async_trait]
pub trait StackOps: Send + Sync {
    /// Declared outputs of a stack (key to value).
    async fn stack_outputs(&self, stack_name: &str) -> Result<HashMap<String, String>, StackError>;

    /// The template body the stack is currently deployed with.
    async fn template_body(&self, stack_name: &str) -> Result<String, StackError>;

    /// Signal completion of a resource (e.g. one instance of a rolling update).
    async fn signal_resource(&self, signal: &ResourceSignal) -> Result<(), StackError>;
}

/// Errors from the stack engine.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("stack not found: {0}")]
    StackNotFound(String),

    #[error("stack is not accepting signals: {0}")]
    NotAcceptingSignals(String),

    #[error("stack request throttled: {0}")]
    Throttled(String),

    #[error("stack engine error: {0}")]
    Service(String),
}
