// ABOUTME: Artifact preparation parameterized by state marker.
// ABOUTME: Validate, assume role, stage, write parameters, package template; strictly in that order.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::cloud::{CredentialBroker, ImageCatalog, ObjectStore};
use crate::deploy::error::DeployError;
use crate::pipeline::PipelineJob;
use crate::types::{JobId, ObjectLocation};

use super::archive::{package_template, read_entry};
use super::manifest::{BuildManifest, MANIFEST_FILE};
use super::state::{Assumed, Packaged, ParametersWritten, Staged, StagedValues, Validated};

/// Input-object metadata key holding the source revision summary.
pub const REVISION_SUMMARY_KEY: &str = "codepipeline-artifact-revision-summary";

/// Revision summary used when the input object has none.
pub const NO_REVISION_SUMMARY: &str = "-";

/// What kind of artifact a preparation deploys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    App,
}

impl ArtifactKind {
    /// Role-session name used in the target account.
    pub fn session_name(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "prepare-ami-deployment",
            ArtifactKind::App => "prepare-app-deployment",
        }
    }

    /// `ParameterNames` keys for the id and name values.
    pub fn parameter_keys(&self) -> (&'static str, &'static str) {
        match self {
            ArtifactKind::Image => ("ImageId", "ImageName"),
            ArtifactKind::App => ("AppVersionId", "AppVersionName"),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Image => f.write_str("image"),
            ArtifactKind::App => f.write_str("app"),
        }
    }
}

/// Everything a preparation needs from its job, checked up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparePlan {
    pub kind: ArtifactKind,
    pub job_id: JobId,
    pub role_arn: String,
    pub stack_name: String,
    pub template_filename: String,
    pub input: ObjectLocation,
    pub output: ObjectLocation,
    pub id_parameter: String,
    pub name_parameter: String,
    /// Where the app variant copies the bundle. `None` for images.
    pub app_location: Option<ObjectLocation>,
}

impl PreparePlan {
    pub fn from_job(kind: ArtifactKind, job: &PipelineJob) -> Result<Self, DeployError> {
        let params = job.user_parameters()?;
        let (id_key, name_key) = kind.parameter_keys();
        let app_location = match kind {
            ArtifactKind::App => Some(params.require_app_location()?.clone()),
            ArtifactKind::Image => None,
        };

        Ok(Self {
            kind,
            job_id: job.id.clone(),
            role_arn: params.require_role()?.to_string(),
            stack_name: params.require_stack_name()?.to_string(),
            template_filename: params.require_template_filename()?.to_string(),
            input: job.input_location()?,
            output: job.output_location()?,
            id_parameter: params.require_parameter_name(id_key)?.to_string(),
            name_parameter: params.require_parameter_name(name_key)?.to_string(),
            app_location,
        })
    }
}

/// A preparation in progress, parameterized by its current state.
///
/// Parameters cannot be written before anything is staged:
///
/// ```compile_fail
/// use fleetroll::deploy::prepare::{Preparation, Validated};
///
/// async fn skip_ahead(preparation: Preparation<Validated>) {
///     let _ = preparation.write_parameters().await;
/// }
/// ```
#[derive(Debug)]
pub struct Preparation<S> {
    pub(crate) plan: PreparePlan,
    pub(crate) state: S,
}

/// What a finished preparation published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedArtifact {
    pub kind: ArtifactKind,
    pub id_parameter: String,
    pub id: String,
    pub name_parameter: String,
    pub name: String,
    pub template_artifact: ObjectLocation,
}

impl<S> Preparation<S> {
    pub fn plan(&self) -> &PreparePlan {
        &self.plan
    }

    fn transition<T>(self, state: T) -> Preparation<T> {
        Preparation {
            plan: self.plan,
            state,
        }
    }
}

impl Preparation<Validated> {
    pub fn new(kind: ArtifactKind, job: &PipelineJob) -> Result<Self, DeployError> {
        Ok(Preparation {
            plan: PreparePlan::from_job(kind, job)?,
            state: Validated,
        })
    }

    /// Obtain target-account clients.
    pub async fn assume_role<C>(self, broker: &C) -> Result<Preparation<Assumed>, DeployError>
    where
        C: CredentialBroker + ?Sized,
    {
        let target = broker
            .assume_role(&self.plan.role_arn, self.plan.kind.session_name())
            .await?;
        Ok(self.transition(Assumed { target }))
    }
}

impl Preparation<Assumed> {
    /// Image variant: read the build manifest and look up the image's name.
    ///
    /// `artifacts` is the pipeline account's storage holding the input artifact.
    pub async fn stage_image<A, I>(
        self,
        artifacts: &A,
        images: &I,
    ) -> Result<Preparation<Staged>, DeployError>
    where
        A: ObjectStore + ?Sized,
        I: ImageCatalog + ?Sized,
    {
        let archive = artifacts.get_object(&self.plan.input).await?;
        let manifest = read_entry(&archive, MANIFEST_FILE)?.ok_or_else(|| {
            DeployError::InvalidManifest(format!("{} not found in input artifact", MANIFEST_FILE))
        })?;
        tracing::debug!(manifest = %manifest, "read build manifest");

        let image_id = BuildManifest::parse(&manifest)?.image_id()?;
        tracing::info!(image = %image_id, "image from manifest");
        let image_name = images.image_name(&image_id).await?;
        tracing::info!(image = %image_id, name = %image_name, "image name");

        let values = StagedValues {
            id: image_id.into_inner(),
            name: image_name,
        };
        let target = self.state.target.clone();
        Ok(self.transition(Staged { target, values }))
    }

    /// App variant: take the revision summary and copy the bundle into the
    /// target account's app location, which yields a new version id.
    pub async fn stage_app<A>(self, artifacts: &A) -> Result<Preparation<Staged>, DeployError>
    where
        A: ObjectStore + ?Sized,
    {
        let destination = self
            .plan
            .app_location
            .clone()
            .ok_or_else(|| DeployError::MissingSetting("AppLocation".to_string()))?;

        let metadata = artifacts.object_metadata(&self.plan.input).await?;
        let summary = metadata
            .get(REVISION_SUMMARY_KEY)
            .cloned()
            .unwrap_or_else(|| NO_REVISION_SUMMARY.to_string());
        tracing::info!(name = %summary, "app version name");

        let version = self
            .state
            .target
            .storage
            .copy_object(&self.plan.input, &destination)
            .await?;
        tracing::info!(version = %version, "copied app to {}", destination);

        let values = StagedValues {
            id: version.into_inner(),
            name: summary,
        };
        let target = self.state.target.clone();
        Ok(self.transition(Staged { target, values }))
    }
}

impl Preparation<Staged> {
    /// Overwrite both parameters. Safe to repeat on retry.
    pub async fn write_parameters(self) -> Result<Preparation<ParametersWritten>, DeployError> {
        let Staged { target, values } = &self.state;
        target
            .parameters
            .put_parameter(&self.plan.id_parameter, &values.id, true)
            .await?;
        target
            .parameters
            .put_parameter(&self.plan.name_parameter, &values.name, true)
            .await?;

        let state = ParametersWritten {
            target: target.clone(),
            values: values.clone(),
        };
        Ok(self.transition(state))
    }

    pub fn values(&self) -> &StagedValues {
        &self.state.values
    }
}

impl Preparation<ParametersWritten> {
    /// Zip the target stack's current template under the configured filename
    /// and upload it as the job's output artifact.
    pub async fn package_template<A>(self, artifacts: &A) -> Result<Preparation<Packaged>, DeployError>
    where
        A: ObjectStore + ?Sized,
    {
        let template = self
            .state
            .target
            .stack
            .template_body(&self.plan.stack_name)
            .await?;
        let archive = package_template(&self.plan.template_filename, &template)?;
        artifacts
            .put_object(&self.plan.output, Bytes::from(archive))
            .await?;
        tracing::info!(output = %self.plan.output, "uploaded template artifact");

        let state = Packaged {
            values: self.state.values.clone(),
            output: self.plan.output.clone(),
        };
        Ok(self.transition(state))
    }
}

impl Preparation<Packaged> {
    pub fn finish(self) -> PreparedArtifact {
        PreparedArtifact {
            kind: self.plan.kind,
            id_parameter: self.plan.id_parameter,
            id: self.state.values.id,
            name_parameter: self.plan.name_parameter,
            name: self.state.values.name,
            template_artifact: self.state.output,
        }
    }
}
