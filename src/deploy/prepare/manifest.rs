// ABOUTME: Image build manifest shipped inside the image pipeline's artifact.
// ABOUTME: The newest build's first region:image pair names the image to deploy.

use serde::Deserialize;

use crate::deploy::error::DeployError;
use crate::types::ImageId;

/// Name of the manifest entry inside the input artifact.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildManifest {
    #[serde(default)]
    pub builds: Vec<Build>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub name: Option<String>,
    /// `region:image[,region:image...]`
    pub artifact_id: String,
}

impl BuildManifest {
    pub fn parse(json: &str) -> Result<Self, DeployError> {
        serde_json::from_str(json).map_err(|e| DeployError::InvalidManifest(e.to_string()))
    }

    /// Image produced by the last build.
    pub fn image_id(&self) -> Result<ImageId, DeployError> {
        let build = self
            .builds
            .last()
            .ok_or_else(|| DeployError::InvalidManifest("no builds".to_string()))?;

        build
            .artifact_id
            .split(',')
            .next()
            .and_then(|pair| pair.split_once(':'))
            .map(|(_, image)| image.trim())
            .filter(|image| !image.is_empty())
            .map(ImageId::new)
            .ok_or_else(|| {
                DeployError::InvalidManifest(format!(
                    "artifact_id '{}' is not region:image",
                    build.artifact_id
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_build_wins() {
        let manifest = BuildManifest::parse(
            r#"{"builds": [
                {"name": "old", "artifact_id": "eu-west-1:ami-old"},
                {"name": "new", "artifact_id": "eu-west-1:ami-new", "builder_type": "amazon-ebs"}
            ], "last_run_uuid": "x"}"#,
        )
        .unwrap();
        assert_eq!(manifest.image_id().unwrap().as_str(), "ami-new");
    }

    #[test]
    fn first_region_of_multi_region_build() {
        let manifest = BuildManifest::parse(
            r#"{"builds": [{"artifact_id": "eu-west-1:ami-1,us-east-1:ami-2"}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.image_id().unwrap().as_str(), "ami-1");
    }

    #[test]
    fn empty_or_malformed_manifests_are_rejected() {
        let empty = BuildManifest::parse(r#"{"builds": []}"#).unwrap();
        assert!(matches!(empty.image_id(), Err(DeployError::InvalidManifest(_))));

        let bare = BuildManifest::parse(r#"{"builds": [{"artifact_id": "ami-1"}]}"#).unwrap();
        assert!(matches!(bare.image_id(), Err(DeployError::InvalidManifest(_))));

        assert!(BuildManifest::parse("[").is_err());
    }
}
