// ABOUTME: Blocks a stack update while fleet instances wait on a termination hook.
// ABOUTME: Observes only; never mutates the fleet.

use serde_json::Value;
use std::sync::Arc;

use crate::cloud::{FleetError, FleetOps};
use crate::resource::{
    CallbackTransport, CustomResourceRequest, CustomResourceResponse, ResponderError, ResponseData,
    respond,
};

use super::FleetDefaults;
use super::error::DeployError;
use super::poll::{PollPolicy, Polled, Probe, poll_until};
use super::sizing::FLEET_NAME;

/// Response data key carrying the fleet's stable identifier.
pub const FLEET_ARN: &str = "AutoScalingGroupARN";

/// Wait until no instance of `fleet_name` is in `Terminating:Wait`.
///
/// Returns the fleet's identifier, or an empty string when the fleet does not
/// exist. Throttled describes count as a pending attempt.
pub async fn await_drain<F>(
    fleet_name: &str,
    fleet: &F,
    policy: &PollPolicy,
) -> Result<String, DeployError>
where
    F: FleetOps + ?Sized,
{
    let polled = poll_until(policy, |attempt| async move {
        let description = match fleet.describe_fleet(fleet_name).await {
            Ok(description) => description,
            Err(FleetError::Throttled(message)) => {
                tracing::warn!(fleet = %fleet_name, attempt, "describe throttled: {}", message);
                return Ok(Probe::Pending);
            }
            Err(e) => return Err(DeployError::from(e)),
        };

        let Some(description) = description else {
            tracing::info!(fleet = %fleet_name, "fleet does not exist");
            return Ok(Probe::Ready(String::new()));
        };

        let draining: Vec<_> = description
            .draining_instances()
            .map(|i| i.id.to_string())
            .collect();
        if draining.is_empty() {
            return Ok(Probe::Ready(description.arn));
        }
        for instance in &draining {
            tracing::info!(fleet = %fleet_name, attempt, "Waiting for {} terminate lifecycle action", instance);
        }
        Ok(Probe::Pending)
    })
    .await?;

    match polled {
        Polled::Ready { value, attempts } => {
            tracing::debug!(fleet = %fleet_name, attempts, "fleet drained");
            Ok(value)
        }
        Polled::Exhausted { attempts } => Err(DeployError::DrainTimeout {
            fleet: fleet_name.to_string(),
            attempts,
        }),
    }
}

/// Wait out the drain for a request's fleet and build its response data.
pub async fn drain_response_data<F>(
    request: &CustomResourceRequest,
    defaults: &FleetDefaults,
    policy: &PollPolicy,
    fleet: &F,
) -> Result<ResponseData, DeployError>
where
    F: FleetOps + ?Sized,
{
    let name = request
        .property(FLEET_NAME)
        .or_else(|| defaults.name.clone())
        .ok_or_else(|| DeployError::MissingSetting(format!("{} (or fleet.name)", FLEET_NAME)))?;
    let arn = await_drain(&name, fleet, policy).await?;

    let mut data = ResponseData::new();
    data.insert(FLEET_ARN.to_string(), Value::from(arn));
    Ok(data)
}

/// Answer a drain-wait custom resource. Exactly one response is delivered.
pub async fn handle_drain_request<F>(
    request: CustomResourceRequest,
    defaults: &FleetDefaults,
    policy: &PollPolicy,
    fleet: &F,
    transport: Arc<dyn CallbackTransport>,
) -> Result<CustomResourceResponse, ResponderError>
where
    F: FleetOps + ?Sized,
{
    let computation = drain_response_data(&request, defaults, policy, fleet);
    respond(request.clone(), transport, computation).await
}
