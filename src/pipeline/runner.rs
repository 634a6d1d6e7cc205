// ABOUTME: Runs a pipeline action and reports its outcome exactly once.
// ABOUTME: Errors and panics become a failed-job report instead of escaping.

use futures::FutureExt;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::cloud::{FailureDetails, FailureKind, PipelineError, PipelineOps};
use crate::resource::{panic_message, truncate_chars};
use crate::types::JobId;

/// Longest failure message the pipeline engine accepts.
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 5000;

/// What was reported for a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome<T> {
    Succeeded { result: T },
    Failed { details: FailureDetails },
}

impl<T> JobOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }
}

/// Run `work` for `job` and report success or failure to the pipeline engine.
///
/// The returned error covers only the report itself; a failed action is a
/// successful report of `JobOutcome::Failed`.
pub async fn run_job<P, F, T, E>(
    job: &JobId,
    pipeline: &P,
    work: F,
) -> Result<JobOutcome<T>, PipelineError>
where
    P: PipelineOps + ?Sized,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let message = match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(result)) => {
            tracing::info!(job = %job, "job succeeded");
            pipeline.put_job_success(job).await?;
            return Ok(JobOutcome::Succeeded { result });
        }
        Ok(Err(e)) => e.to_string(),
        Err(panic) => panic_message(panic.as_ref()),
    };

    tracing::error!(job = %job, "job failed: {}", message);
    let details = FailureDetails {
        kind: FailureKind::JobFailed,
        message: truncate_chars(&message, MAX_FAILURE_MESSAGE_CHARS),
    };
    pipeline.put_job_failure(job, &details).await?;
    Ok(JobOutcome::Failed { details })
}
