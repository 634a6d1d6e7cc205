// ABOUTME: Pipeline engine trait for reporting job outcomes.
// ABOUTME: Each job is reported exactly once, as success or failure.

use super::shared_types::FailureDetails;
use crate::types::JobId;
use async_trait::async_trait;

/// Job result reporting to the pipeline engine.
#[async_trait]
pub trait PipelineOps: Send + Sync {
    async fn put_job_success(&self, job: &JobId) -> Result<(), PipelineError>;

    async fn put_job_failure(
        &self,
        job: &JobId,
        details: &FailureDetails,
    ) -> Result<(), PipelineError>;
}

/// Errors from the pipeline engine.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("job is not in a reportable state: {0}")]
    InvalidJobState(String),

    #[error("pipeline service error: {0}")]
    Service(String),
}
