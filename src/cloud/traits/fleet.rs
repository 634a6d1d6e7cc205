// ABOUTME: Fleet control trait for managed compute groups.
// ABOUTME: Describes a fleet's desired capacity and instance lifecycle states.

use super::shared_types::FleetDescription;
use async_trait::async_trait;

/// Read access to managed compute fleets.
#[async_trait]
pub trait FleetOps: Send + Sync {
    /// Describe a fleet by name. Returns `None` if the fleet does not exist.
    async fn describe_fleet(&self, name: &str) -> Result<Option<FleetDescription>, FleetError>;
}

/// Errors from fleet operations.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("fleet request throttled: {0}")]
    Throttled(String),

    #[error("fleet service error: {0}")]
    Service(String),
}
