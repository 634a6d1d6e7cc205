// ABOUTME: Load-balancer health query trait.
// ABOUTME: Describes target groups and reports per-instance target health.

use super::shared_types::{TargetGroup, TargetHealthState};
use crate::types::{InstanceId, TargetGroupArn};
use async_trait::async_trait;

/// Health queries against load-balancer target groups.
#[async_trait]
pub trait HealthOps: Send + Sync {
    /// Describe the given target groups, including the port targets register on.
    async fn describe_target_groups(
        &self,
        arns: &[TargetGroupArn],
    ) -> Result<Vec<TargetGroup>, HealthError>;

    /// Current health of one instance/port pair in a target group.
    async fn target_health(
        &self,
        target_group: &TargetGroupArn,
        instance: &InstanceId,
        port: u16,
    ) -> Result<TargetHealthState, HealthError>;
}

/// Errors from health queries.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("target group not found: {0}")]
    TargetGroupNotFound(String),

    /// The instance is not (yet) registered with the target group.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("health request throttled: {0}")]
    Throttled(String),

    #[error("load balancer service error: {0}")]
    Service(String),
}
