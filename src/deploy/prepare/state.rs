// ABOUTME: Preparation state types for the type state pattern.
// ABOUTME: Each state carries what the next step needs, so steps cannot be skipped or reordered.

use crate::cloud::TargetAccount;
use crate::types::ObjectLocation;

/// The two values a preparation publishes to the parameter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedValues {
    /// Image id or application version id.
    pub id: String,
    /// Image name or revision summary.
    pub name: String,
}

/// Job parameters checked, nothing external touched.
/// Available actions: `assume_role()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// Target-account clients obtained.
/// Available actions: `stage_image()`, `stage_app()`
#[derive(Debug, Clone)]
pub struct Assumed {
    pub(crate) target: TargetAccount,
}

/// Artifact identified (image) or copied into place (app).
/// Available actions: `write_parameters()`
#[derive(Debug, Clone)]
pub struct Staged {
    pub(crate) target: TargetAccount,
    pub(crate) values: StagedValues,
}

/// Parameter store updated.
/// Available actions: `package_template()`
#[derive(Debug, Clone)]
pub struct ParametersWritten {
    pub(crate) target: TargetAccount,
    pub(crate) values: StagedValues,
}

/// Template uploaded to the output artifact.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Packaged {
    pub(crate) values: StagedValues,
    pub(crate) output: ObjectLocation,
}
