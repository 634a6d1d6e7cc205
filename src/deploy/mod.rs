// ABOUTME: Deployment orchestration components.
// ABOUTME: Sizing, drain wait, health signal, artifact preparation, and version reaping.

pub mod drain;
mod error;
pub mod poll;
pub mod prepare;
pub mod reap;
pub mod signal;
pub mod sizing;

pub use drain::{FLEET_ARN, await_drain, drain_response_data, handle_drain_request};
pub use error::{DeployError, DeployErrorKind};
pub use poll::{PollBudget, PollPolicy, PollState, Polled, Probe, poll_until};
pub use prepare::{ArtifactKind, PreparedArtifact, handle_prepare_job, prepare_deployment};
pub use reap::{CLEANUP_SESSION, ReapPlan, ReapReport, handle_reap_job, plan_reap, reap_versions};
pub use signal::{LaunchEvent, SignalTarget, signal_when_healthy};
pub use sizing::{
    FleetSpec, SizePlan, ZeroReason, clamp_in_service, handle_size_request, resolve_fleet_size,
};

/// Fleet settings used when a request's properties leave them out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetDefaults {
    pub name: Option<String>,
    pub default_image_parameter: Option<String>,
}
