// ABOUTME: Object storage locations and artifact versions.
// ABOUTME: Bucket/key pairs as they appear in pipeline user parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::VersionId;

/// A bucket and key in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn version(&self, version_id: VersionId) -> ArtifactVersion {
        ArtifactVersion {
            location: self.clone(),
            version_id,
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// One stored version of an artifact object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub location: ObjectLocation,
    pub version_id: VersionId,
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?versionId={}", self.location, self.version_id)
    }
}
