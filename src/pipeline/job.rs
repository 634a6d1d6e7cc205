// ABOUTME: Pipeline job event as delivered to a stage action.
// ABOUTME: camelCase envelope with JSON-encoded user parameters inside.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{JobId, ObjectLocation};

/// Errors reading a job's artifacts or parameters.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job has no input artifact")]
    MissingInputArtifact,

    #[error("job has no output artifact")]
    MissingOutputArtifact,

    #[error("UserParameters is not valid JSON: {0}")]
    InvalidUserParameters(#[from] serde_json::Error),

    #[error("missing user parameter {0}")]
    MissingParameter(String),
}

/// The top-level event: `{"CodePipeline.job": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: PipelineJob,
}

impl PipelineEvent {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One stage-action invocation. Consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    pub id: JobId,
    #[serde(default)]
    pub account_id: Option<String>,
    pub data: JobData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    pub action_configuration: ActionConfiguration,
    #[serde(default)]
    pub input_artifacts: Vec<JobArtifact>,
    #[serde(default)]
    pub output_artifacts: Vec<JobArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfiguration {
    pub configuration: ActionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSettings {
    #[serde(rename = "FunctionName", default)]
    pub function_name: Option<String>,
    #[serde(rename = "UserParameters", default)]
    pub user_parameters: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobArtifact {
    pub name: String,
    #[serde(default)]
    pub revision: Option<String>,
    pub location: ArtifactLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub s3_location: StoredArtifact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtifact {
    pub bucket_name: String,
    pub object_key: String,
}

impl From<&StoredArtifact> for ObjectLocation {
    fn from(artifact: &StoredArtifact) -> Self {
        ObjectLocation::new(&artifact.bucket_name, &artifact.object_key)
    }
}

impl PipelineJob {
    /// Location of the first input artifact.
    pub fn input_location(&self) -> Result<ObjectLocation, JobError> {
        self.data
            .input_artifacts
            .first()
            .map(|a| ObjectLocation::from(&a.location.s3_location))
            .ok_or(JobError::MissingInputArtifact)
    }

    /// Location of the first output artifact.
    pub fn output_location(&self) -> Result<ObjectLocation, JobError> {
        self.data
            .output_artifacts
            .first()
            .map(|a| ObjectLocation::from(&a.location.s3_location))
            .ok_or(JobError::MissingOutputArtifact)
    }

    pub fn user_parameters(&self) -> Result<UserParameters, JobError> {
        UserParameters::parse(&self.data.action_configuration.configuration.user_parameters)
    }
}

/// Action settings encoded as a JSON string in the job configuration.
///
/// Every field is optional on the wire; each action checks the ones it needs
/// with the `require_*` accessors before doing anything external.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserParameters {
    #[serde(default)]
    pub assume_role_arn: Option<String>,
    #[serde(default)]
    pub stack_name: Option<String>,
    #[serde(default)]
    pub template_filename: Option<String>,
    #[serde(default)]
    pub parameter_names: BTreeMap<String, String>,
    #[serde(default)]
    pub app_location: Option<ObjectLocation>,
    #[serde(default)]
    pub live_version_output: Option<String>,
}

/// Stack output naming the live application version when none is configured.
pub const DEFAULT_LIVE_VERSION_OUTPUT: &str = "AppVersionId";

impl UserParameters {
    pub fn parse(json: &str) -> Result<Self, JobError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn require_role(&self) -> Result<&str, JobError> {
        required(self.assume_role_arn.as_deref(), "AssumeRoleArn")
    }

    pub fn require_stack_name(&self) -> Result<&str, JobError> {
        required(self.stack_name.as_deref(), "StackName")
    }

    pub fn require_template_filename(&self) -> Result<&str, JobError> {
        required(self.template_filename.as_deref(), "TemplateFilename")
    }

    pub fn require_app_location(&self) -> Result<&ObjectLocation, JobError> {
        self.app_location
            .as_ref()
            .ok_or_else(|| JobError::MissingParameter("AppLocation".to_string()))
    }

    /// Parameter-store name configured under `ParameterNames.<key>`.
    pub fn require_parameter_name(&self, key: &str) -> Result<&str, JobError> {
        self.parameter_names
            .get(key)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| JobError::MissingParameter(format!("ParameterNames.{}", key)))
    }

    pub fn live_version_output(&self) -> &str {
        self.live_version_output
            .as_deref()
            .unwrap_or(DEFAULT_LIVE_VERSION_OUTPUT)
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, JobError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| JobError::MissingParameter(name.to_string()))
}
