// ABOUTME: Shared types used across cloud capability trait definitions.
// ABOUTME: FleetDescription, LifecycleState, TargetGroup, ResourceSignal, FailureDetails, etc.

use crate::types::{InstanceId, TargetGroupArn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current view of a managed compute fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetDescription {
    /// Fleet name.
    pub name: String,
    /// Stable identifier of the fleet.
    pub arn: String,
    /// Number of instances the fleet is currently trying to run.
    pub desired_capacity: u32,
    /// Instances currently attached to the fleet.
    #[serde(default)]
    pub instances: Vec<FleetInstance>,
}

impl FleetDescription {
    /// Instances paused before termination, waiting on a lifecycle hook.
    pub fn draining_instances(&self) -> impl Iterator<Item = &FleetInstance> {
        self.instances
            .iter()
            .filter(|instance| instance.lifecycle_state == LifecycleState::TerminatingWait)
    }
}

/// An instance as observed through the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetInstance {
    pub id: InstanceId,
    pub lifecycle_state: LifecycleState,
}

/// Position of an instance in its launch/terminate sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LifecycleState {
    Pending,
    PendingWait,
    PendingProceed,
    InService,
    Standby,
    Terminating,
    TerminatingWait,
    TerminatingProceed,
    Terminated,
    /// A state this crate does not model explicitly.
    Other(String),
}

impl LifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Pending => "Pending",
            LifecycleState::PendingWait => "Pending:Wait",
            LifecycleState::PendingProceed => "Pending:Proceed",
            LifecycleState::InService => "InService",
            LifecycleState::Standby => "Standby",
            LifecycleState::Terminating => "Terminating",
            LifecycleState::TerminatingWait => "Terminating:Wait",
            LifecycleState::TerminatingProceed => "Terminating:Proceed",
            LifecycleState::Terminated => "Terminated",
            LifecycleState::Other(state) => state,
        }
    }
}

impl FromStr for LifecycleState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Pending" => LifecycleState::Pending,
            "Pending:Wait" => LifecycleState::PendingWait,
            "Pending:Proceed" => LifecycleState::PendingProceed,
            "InService" => LifecycleState::InService,
            "Standby" => LifecycleState::Standby,
            "Terminating" => LifecycleState::Terminating,
            "Terminating:Wait" => LifecycleState::TerminatingWait,
            "Terminating:Proceed" => LifecycleState::TerminatingProceed,
            "Terminated" => LifecycleState::Terminated,
            other => LifecycleState::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for LifecycleState {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A load-balancer target group and the port instances register on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub arn: TargetGroupArn,
    pub port: u16,
}

/// Health of one target as reported by its target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetHealthState {
    Initial,
    Healthy,
    Unhealthy,
    Unused,
    Draining,
    Unavailable,
}

/// Completion status sent to the stack engine for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStatus {
    Success,
    Failure,
}

/// A signal-resource call against the stack engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSignal {
    pub stack_name: String,
    pub logical_resource_id: String,
    /// Uniqueness token; the stack engine counts one signal per token.
    pub unique_id: InstanceId,
    pub status: SignalStatus,
}

/// Category of a failed pipeline job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    JobFailed,
    ConfigurationError,
    PermissionError,
}

/// Diagnostic attached to a failed pipeline job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    #[serde(rename = "type")]
    pub kind: FailureKind,
    pub message: String,
}
