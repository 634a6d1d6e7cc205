// ABOUTME: Pipeline action staging an image or app artifact for a stack deploy stage.
// ABOUTME: Runs the preparation steps in order and reports the job outcome once.

mod archive;
mod manifest;
mod preparation;
mod state;

pub use archive::{package_template, read_entry};
pub use manifest::{Build, BuildManifest, MANIFEST_FILE};
pub use preparation::{
    ArtifactKind, NO_REVISION_SUMMARY, PreparePlan, Preparation, PreparedArtifact,
    REVISION_SUMMARY_KEY,
};
pub use state::{Assumed, Packaged, ParametersWritten, Staged, StagedValues, Validated};

use crate::cloud::{CredentialBroker, ImageCatalog, ObjectStore, PipelineError, PipelineOps};
use crate::pipeline::{JobOutcome, PipelineJob, run_job};

use super::error::DeployError;

/// Prepare a deployment of `kind` for `job`.
///
/// `artifacts` is the pipeline account's storage; target-account clients come
/// from `broker`. Steps are not transactional: parameters written before a
/// later failure stay written.
pub async fn prepare_deployment<A, I, C>(
    kind: ArtifactKind,
    job: &PipelineJob,
    artifacts: &A,
    images: &I,
    broker: &C,
) -> Result<PreparedArtifact, DeployError>
where
    A: ObjectStore + ?Sized,
    I: ImageCatalog + ?Sized,
    C: CredentialBroker + ?Sized,
{
    let preparation = Preparation::new(kind, job)?;
    tracing::info!(job = %job.id, %kind, "preparing deployment");

    let assumed = preparation.assume_role(broker).await?;
    let staged = match kind {
        ArtifactKind::Image => assumed.stage_image(artifacts, images).await?,
        ArtifactKind::App => assumed.stage_app(artifacts).await?,
    };
    let packaged = staged
        .write_parameters()
        .await?
        .package_template(artifacts)
        .await?;

    Ok(packaged.finish())
}

/// Run a preparation as a pipeline job and report its outcome.
pub async fn handle_prepare_job<A, I, C, P>(
    kind: ArtifactKind,
    job: &PipelineJob,
    artifacts: &A,
    images: &I,
    broker: &C,
    pipeline: &P,
) -> Result<JobOutcome<PreparedArtifact>, PipelineError>
where
    A: ObjectStore + ?Sized,
    I: ImageCatalog + ?Sized,
    C: CredentialBroker + ?Sized,
    P: PipelineOps + ?Sized,
{
    run_job(
        &job.id,
        pipeline,
        prepare_deployment(kind, job, artifacts, images, broker),
    )
    .await
}
