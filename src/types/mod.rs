// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types for IDs and explicit variants for sentinel values.

mod id;
mod location;
mod sentinel;

pub use id::{Id, ImageId, InstanceId, JobId, TargetGroupArn, VersionId};
pub use location::{ArtifactVersion, ObjectLocation};
pub use sentinel::{ArtifactRef, InServiceTarget, ParseInServiceError, UNPUBLISHED};
