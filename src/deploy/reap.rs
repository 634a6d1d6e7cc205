// ABOUTME: Pipeline action deleting artifact versions the deployed stack no longer uses.
// ABOUTME: The live version named by the stack's output is never deleted.

use serde::Serialize;

use crate::cloud::{CredentialBroker, PipelineError, PipelineOps};
use crate::pipeline::{JobOutcome, PipelineJob, run_job};
use crate::types::{ObjectLocation, VersionId};

use super::error::DeployError;

/// Role-session name used in the target account.
pub const CLEANUP_SESSION: &str = "cleanup-app-deployment";

/// Which stored versions survive and which go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapPlan {
    /// The live version, if it is among the stored ones.
    pub keep: Option<VersionId>,
    pub delete: Vec<VersionId>,
}

/// Decide what to delete. Duplicates collapse; order of first appearance is kept.
///
/// When the live version is not stored at all the store and the stack
/// disagree, so nothing is deleted.
pub fn plan_reap(stored: &[VersionId], live: &VersionId) -> ReapPlan {
    let mut distinct: Vec<&VersionId> = Vec::with_capacity(stored.len());
    for version in stored {
        if !distinct.contains(&version) {
            distinct.push(version);
        }
    }

    if !distinct.contains(&live) {
        return ReapPlan {
            keep: None,
            delete: Vec::new(),
        };
    }

    ReapPlan {
        keep: Some(live.clone()),
        delete: distinct
            .into_iter()
            .filter(|v| *v != live)
            .cloned()
            .collect(),
    }
}

/// What a reap did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReapReport {
    pub location: ObjectLocation,
    pub live: VersionId,
    pub kept: Option<VersionId>,
    pub deleted: Vec<VersionId>,
}

/// Delete every version of the app artifact except the stack's live one.
///
/// A stack update that changes the live version between listing and deleting
/// can lose the new version; runs are expected to follow a completed deploy
/// stage of the same pipeline.
pub async fn reap_versions<C>(job: &PipelineJob, broker: &C) -> Result<ReapReport, DeployError>
where
    C: CredentialBroker + ?Sized,
{
    let params = job.user_parameters()?;
    let location = params.require_app_location()?.clone();
    let stack_name = params.require_stack_name()?;
    let role = params.require_role()?;
    let output = params.live_version_output();

    let target = broker.assume_role(role, CLEANUP_SESSION).await?;

    let stored = target.storage.list_versions(&location).await?;
    let outputs = target.stack.stack_outputs(stack_name).await?;
    let live = outputs
        .get(output)
        .map(VersionId::new)
        .ok_or_else(|| DeployError::MissingOutput {
            stack: stack_name.to_string(),
            output: output.to_string(),
        })?;

    let plan = plan_reap(&stored, &live);
    if plan.keep.is_none() {
        tracing::warn!(
            location = %location,
            live = %live,
            "live version is not stored; deleting nothing"
        );
    }

    let mut deleted = Vec::with_capacity(plan.delete.len());
    for version in plan.delete {
        tracing::info!(location = %location, version = %version, "DELETE");
        target.storage.delete_version(&location, &version).await?;
        deleted.push(version);
    }

    Ok(ReapReport {
        location,
        live,
        kept: plan.keep,
        deleted,
    })
}

/// Run a reap as a pipeline job and report its outcome.
pub async fn handle_reap_job<C, P>(
    job: &PipelineJob,
    broker: &C,
    pipeline: &P,
) -> Result<JobOutcome<ReapReport>, PipelineError>
where
    C: CredentialBroker + ?Sized,
    P: PipelineOps + ?Sized,
{
    run_job(&job.id, pipeline, reap_versions(job, broker)).await
}
