// ABOUTME: Fleet sizing for a stack update, answered as a custom resource.
// ABOUTME: Zero while deleting or unpublished; otherwise requested sizes with a clamped in-service count.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::cloud::{FleetOps, ParameterStore};
use crate::resource::{
    CallbackTransport, CustomResourceRequest, CustomResourceResponse, ResponderError, ResponseData,
    respond,
};
use crate::types::{ArtifactRef, ImageId, InServiceTarget};

use super::FleetDefaults;
use super::error::DeployError;

pub const IMAGE_ID: &str = "ImageId";
pub const APP_VERSION_ID: &str = "AppVersionId";
pub const MIN_SIZE: &str = "MinSize";
pub const MAX_SIZE: &str = "MaxSize";
pub const MIN_INSTANCES_IN_SERVICE: &str = "MinInstancesInService";
pub const FLEET_NAME: &str = "AutoScalingGroupName";
pub const DEFAULT_IMAGE_PARAMETER: &str = "DefaultAmiParameterName";

/// Resolved sizing for one fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetSpec {
    /// Absent when a zero-size answer needed no fleet lookup.
    pub name: Option<String>,
    pub min_size: u32,
    pub max_size: u32,
    pub min_instances_in_service: u32,
    pub image_id: ImageId,
}

impl FleetSpec {
    pub fn to_response_data(&self) -> ResponseData {
        let mut data = ResponseData::new();
        data.insert(IMAGE_ID.to_string(), Value::from(self.image_id.as_str()));
        data.insert(MIN_SIZE.to_string(), Value::from(self.min_size));
        data.insert(MAX_SIZE.to_string(), Value::from(self.max_size));
        data.insert(
            MIN_INSTANCES_IN_SERVICE.to_string(),
            Value::from(self.min_instances_in_service),
        );
        data
    }
}

/// Why the fleet is held at size zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroReason {
    /// The stack is deleting the fleet.
    Deleting,
    /// An artifact pipeline has not published anything yet.
    Unpublished,
}

/// A sizing request after validation, before any lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizePlan {
    Zero {
        reason: ZeroReason,
        image: ArtifactRef,
    },
    Active {
        image: ImageId,
        min_size: u32,
        max_size: u32,
        in_service: InServiceTarget,
    },
}

impl SizePlan {
    pub fn from_request(request: &CustomResourceRequest) -> Result<Self, DeployError> {
        let image = ArtifactRef::parse(&required(request, IMAGE_ID)?);
        let app = request.property(APP_VERSION_ID).map(|v| ArtifactRef::parse(&v));

        if request.is_delete() {
            return Ok(SizePlan::Zero {
                reason: ZeroReason::Deleting,
                image,
            });
        }
        let unpublished =
            image.is_unpublished() || app.as_ref().is_some_and(ArtifactRef::is_unpublished);
        if unpublished {
            return Ok(SizePlan::Zero {
                reason: ZeroReason::Unpublished,
                image,
            });
        }

        let min_size = parse_count(request, MIN_SIZE)?;
        let max_size = parse_count(request, MAX_SIZE)?;
        if min_size > max_size {
            return Err(DeployError::InvalidProperty {
                name: MIN_SIZE.to_string(),
                reason: format!("{} is greater than {} {}", min_size, MAX_SIZE, max_size),
            });
        }
        let in_service = required(request, MIN_INSTANCES_IN_SERVICE)?
            .parse::<InServiceTarget>()
            .map_err(|e| DeployError::InvalidProperty {
                name: MIN_INSTANCES_IN_SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        Ok(SizePlan::Active {
            image: ImageId::new(image.to_string()),
            min_size,
            max_size,
            in_service,
        })
    }
}

/// Fit an in-service count between the fleet's bounds.
///
/// Raised to `min_size`, then kept strictly below `max_size` so a rolling
/// update can always take one instance out of service. A fleet of one keeps
/// nothing in service.
pub fn clamp_in_service(candidate: u32, min_size: u32, max_size: u32) -> u32 {
    let raised = candidate.max(min_size);
    if raised >= max_size {
        if max_size > 1 { max_size - 1 } else { 0 }
    } else {
        raised
    }
}

/// Resolve a sizing request against current fleet state.
///
/// Identical inputs and an unchanged desired capacity always give the same
/// result, so duplicate deliveries are harmless.
pub async fn resolve_fleet_size<F, P>(
    request: &CustomResourceRequest,
    defaults: &FleetDefaults,
    fleet: &F,
    parameters: &P,
) -> Result<FleetSpec, DeployError>
where
    F: FleetOps + ?Sized,
    P: ParameterStore + ?Sized,
{
    let plan = SizePlan::from_request(request)?;
    let name = request
        .property(FLEET_NAME)
        .or_else(|| defaults.name.clone());

    match plan {
        SizePlan::Zero { reason, image } => {
            match reason {
                ZeroReason::Deleting => tracing::info!(fleet = ?name, "Delete operation, set to 0"),
                ZeroReason::Unpublished => tracing::info!(fleet = ?name, "New pipeline, set to 0"),
            }
            let image_id = match image {
                ArtifactRef::Published(id) => ImageId::new(id),
                ArtifactRef::Unpublished => {
                    let parameter = request
                        .property(DEFAULT_IMAGE_PARAMETER)
                        .or_else(|| defaults.default_image_parameter.clone())
                        .ok_or_else(|| {
                            DeployError::MissingSetting(format!(
                                "{} (or fleet.default_image_parameter)",
                                DEFAULT_IMAGE_PARAMETER
                            ))
                        })?;
                    // Any valid image will do: nothing launches at size zero.
                    ImageId::new(parameters.get_parameter(&parameter).await?)
                }
            };
            Ok(FleetSpec {
                name,
                min_size: 0,
                max_size: 0,
                min_instances_in_service: 0,
                image_id,
            })
        }
        SizePlan::Active {
            image,
            min_size,
            max_size,
            in_service,
        } => {
            let name = name.ok_or_else(|| {
                DeployError::MissingSetting(format!("{} (or fleet.name)", FLEET_NAME))
            })?;
            let candidate = match in_service {
                InServiceTarget::Fixed(count) => count,
                InServiceTarget::FromDesiredCapacity => {
                    let desired = fleet
                        .describe_fleet(&name)
                        .await?
                        .map(|f| f.desired_capacity)
                        .unwrap_or(0);
                    tracing::info!(
                        fleet = %name,
                        "Using desired capacity for MinInstancesInService={}",
                        desired
                    );
                    desired
                }
            };
            let min_instances_in_service = clamp_in_service(candidate, min_size, max_size);
            if min_instances_in_service != candidate {
                tracing::info!(
                    fleet = %name,
                    "Adjusted MinInstancesInService from {} to {}",
                    candidate,
                    min_instances_in_service
                );
            }
            Ok(FleetSpec {
                name: Some(name),
                min_size,
                max_size,
                min_instances_in_service,
                image_id: image,
            })
        }
    }
}

/// Answer a sizing custom resource. Exactly one response is delivered.
pub async fn handle_size_request<F, P>(
    request: CustomResourceRequest,
    defaults: &FleetDefaults,
    fleet: &F,
    parameters: &P,
    transport: Arc<dyn CallbackTransport>,
) -> Result<CustomResourceResponse, ResponderError>
where
    F: FleetOps + ?Sized,
    P: ParameterStore + ?Sized,
{
    let computation = async {
        resolve_fleet_size(&request, defaults, fleet, parameters)
            .await
            .map(|spec| spec.to_response_data())
    };
    respond(request.clone(), transport, computation).await
}

fn required(request: &CustomResourceRequest, name: &str) -> Result<String, DeployError> {
    request
        .property(name)
        .ok_or_else(|| DeployError::MissingProperty(name.to_string()))
}

fn parse_count(request: &CustomResourceRequest, name: &str) -> Result<u32, DeployError> {
    let raw = required(request, name)?;
    let invalid = |reason: &str| DeployError::InvalidProperty {
        name: name.to_string(),
        reason: format!("'{}' {}", raw, reason),
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("is not an integer"))?;
    if value < 0 {
        return Err(invalid("must not be negative"));
    }
    u32::try_from(value).map_err(|_| invalid("is too large"))
}
