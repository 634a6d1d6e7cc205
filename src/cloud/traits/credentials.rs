// ABOUTME: Cross-account credential delegation trait.
// ABOUTME: Assuming a role yields the target account's service clients.

use super::parameters::ParameterStore;
use super::stack::StackOps;
use super::storage::ObjectStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Service clients scoped to a target account.
#[derive(Clone)]
pub struct TargetAccount {
    pub stack: Arc<dyn StackOps>,
    pub parameters: Arc<dyn ParameterStore>,
    pub storage: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for TargetAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetAccount").finish_non_exhaustive()
    }
}

/// Obtains credentials for another account by assuming a role.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TargetAccount, CredentialError>;
}

/// Errors from role assumption.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("not allowed to assume role: {0}")]
    AccessDenied(String),

    #[error("credential service error: {0}")]
    Service(String),
}
