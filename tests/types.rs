// ABOUTME: Integration tests for identifiers, locations, and sentinel values.
// ABOUTME: Tests parsing, display forms, and wire representations.

use fleetroll::types::*;

mod id_tests {
    use super::*;

    #[test]
    fn version_id_stores_value() {
        let id = VersionId::new("3HL4kqtJlcpXroDTDmJ.rmSpXd3dIbrHY");
        assert_eq!(id.as_str(), "3HL4kqtJlcpXroDTDmJ.rmSpXd3dIbrHY");
    }

    #[test]
    fn instance_id_displays_value() {
        let id = InstanceId::new("i-0abc");
        assert_eq!(id.to_string(), "i-0abc");
    }

    #[test]
    fn image_id_round_trips_through_yaml() {
        let id: ImageId = serde_yaml::from_str("ami-0123").unwrap();
        assert_eq!(id, ImageId::new("ami-0123"));
        assert_eq!(id.into_inner(), "ami-0123");
    }
}

mod location_tests {
    use super::*;

    #[test]
    fn location_displays_bucket_and_key() {
        let location = ObjectLocation::new("apps", "web/app.zip");
        assert_eq!(location.to_string(), "apps/web/app.zip");
    }

    #[test]
    fn artifact_version_names_its_version() {
        let version = ObjectLocation::new("apps", "app.zip").version(VersionId::new("v7"));
        assert_eq!(version.to_string(), "apps/app.zip?versionId=v7");
        assert_eq!(version.version_id.as_str(), "v7");
    }

    #[test]
    fn location_uses_pascal_case_fields() {
        let location: ObjectLocation =
            serde_json::from_str(r#"{"Bucket": "apps", "Key": "app.zip"}"#).unwrap();
        assert_eq!(location, ObjectLocation::new("apps", "app.zip"));
    }
}

mod sentinel_tests {
    use super::*;

    #[test]
    fn unpublished_round_trips_through_display() {
        let artifact = ArtifactRef::parse(UNPUBLISHED);
        assert!(artifact.is_unpublished());
        assert_eq!(artifact.published(), None);
        assert_eq!(artifact.to_string(), UNPUBLISHED);
    }

    #[test]
    fn in_service_rejects_out_of_range_values() {
        let err = "99999999999".parse::<InServiceTarget>().unwrap_err();
        assert!(err.to_string().contains("99999999999"));
    }
}
