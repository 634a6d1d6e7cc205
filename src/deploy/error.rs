// ABOUTME: Error types for the deployment components.
// ABOUTME: Classifies every failure as validation, transient, state inconsistency, or unexpected.

use crate::cloud::{
    CredentialError, FleetError, HealthError, ImageError, ParameterError, StackError, StorageError,
};
use crate::pipeline::JobError;

/// Errors raised by the sizing, drain, signal, prepare, and reap components.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A required resource property is absent.
    #[error("missing resource property {0}")]
    MissingProperty(String),

    /// A resource property is present but unusable.
    #[error("invalid resource property {name}: {reason}")]
    InvalidProperty { name: String, reason: String },

    /// A setting needed by this component is neither in the request nor in config.
    #[error("missing setting {0}")]
    MissingSetting(String),

    /// The pipeline job is missing artifacts or parameters.
    #[error(transparent)]
    Job(#[from] JobError),

    /// The build manifest inside the input artifact is unusable.
    #[error("invalid build manifest: {0}")]
    InvalidManifest(String),

    /// Reading or writing a zip archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Instances were still draining when the poll budget ran out.
    #[error("fleet {fleet} still draining after {attempts} attempts")]
    DrainTimeout { fleet: String, attempts: u32 },

    /// An instance never became healthy within the poll budget.
    #[error("instance {instance} not healthy in {target_group} after {attempts} attempts")]
    HealthTimeout {
        instance: String,
        target_group: String,
        attempts: u32,
    },

    /// A configured target group does not exist.
    #[error("target group not found: {0}")]
    MissingTargetGroup(String),

    /// The stack does not declare the expected output.
    #[error("stack {stack} has no output {output}")]
    MissingOutput { stack: String, output: String },

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error(transparent)]
    Health(#[from] HealthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Missing or malformed input; nothing external was attempted.
    Validation,
    /// Throttling or temporary unavailability; the invoker may retry.
    Transient,
    /// External state disagrees with what the operation needs.
    StateInconsistency,
    /// Anything else.
    Unexpected,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        use DeployErrorKind::*;

        match self {
            DeployError::MissingProperty(_)
            | DeployError::InvalidProperty { .. }
            | DeployError::MissingSetting(_)
            | DeployError::Job(_)
            | DeployError::InvalidManifest(_) => Validation,
            DeployError::Archive(_) => Unexpected,
            DeployError::DrainTimeout { .. } | DeployError::HealthTimeout { .. } => Transient,
            DeployError::MissingTargetGroup(_) | DeployError::MissingOutput { .. } => {
                StateInconsistency
            }
            DeployError::Fleet(e) => match e {
                FleetError::Throttled(_) | FleetError::Service(_) => Transient,
            },
            DeployError::Health(e) => match e {
                HealthError::TargetGroupNotFound(_) | HealthError::InvalidTarget(_) => {
                    StateInconsistency
                }
                HealthError::Throttled(_) | HealthError::Service(_) => Transient,
            },
            DeployError::Storage(e) => match e {
                StorageError::NoSuchBucket(_)
                | StorageError::NoSuchKey(_)
                | StorageError::Unversioned(_) => StateInconsistency,
                StorageError::AccessDenied(_) => Unexpected,
                StorageError::Throttled(_) | StorageError::Service(_) => Transient,
            },
            DeployError::Parameter(e) => match e {
                ParameterError::NotFound(_) | ParameterError::AlreadyExists(_) => {
                    StateInconsistency
                }
                ParameterError::Throttled(_) | ParameterError::Service(_) => Transient,
            },
            DeployError::Stack(e) => match e {
                StackError::StackNotFound(_) | StackError::NotAcceptingSignals(_) => {
                    StateInconsistency
                }
                StackError::Throttled(_) | StackError::Service(_) => Transient,
            },
            DeployError::Image(e) => match e {
                ImageError::NotFound(_) => StateInconsistency,
                ImageError::Throttled(_) | ImageError::Service(_) => Transient,
            },
            DeployError::Credential(e) => match e {
                CredentialError::AccessDenied(_) => Unexpected,
                CredentialError::Service(_) => Transient,
            },
        }
    }
}

impl From<zip::result::ZipError> for DeployError {
    fn from(err: zip::result::ZipError) -> Self {
        DeployError::Archive(err.to_string())
    }
}
