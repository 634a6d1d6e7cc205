// ABOUTME: Signals the stack once a launched instance is healthy in every target group.
// ABOUTME: One signal per instance, keyed by the instance id.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use crate::cloud::{
    HealthError, HealthOps, ResourceSignal, SignalStatus, StackOps, TargetGroup, TargetHealthState,
};
use crate::types::{InstanceId, TargetGroupArn};

use super::error::DeployError;
use super::poll::{PollPolicy, Polled, Probe, poll_until};

/// Instance-launch notification from the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub detail: LaunchDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchDetail {
    #[serde(rename = "EC2InstanceId")]
    pub instance_id: InstanceId,
}

impl LaunchEvent {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.detail.instance_id
    }
}

/// Where to signal and which target groups gate the signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalTarget {
    pub stack_name: String,
    pub logical_resource_id: String,
    pub target_groups: NonEmpty<TargetGroupArn>,
    pub health: PollPolicy,
}

/// Wait for `instance` to be healthy in every configured target group, then
/// send one SUCCESS signal.
///
/// Nothing is signalled if any group is missing or never reports healthy.
pub async fn signal_when_healthy<H, S>(
    instance: &InstanceId,
    target: &SignalTarget,
    health: &H,
    stack: &S,
) -> Result<ResourceSignal, DeployError>
where
    H: HealthOps + ?Sized,
    S: StackOps + ?Sized,
{
    tracing::info!(instance = %instance, "Instance has launched");

    let arns: Vec<TargetGroupArn> = target.target_groups.iter().cloned().collect();
    let described = health.describe_target_groups(&arns).await?;
    let groups = arns
        .iter()
        .map(|arn| {
            described
                .iter()
                .find(|g| &g.arn == arn)
                .cloned()
                .ok_or_else(|| DeployError::MissingTargetGroup(arn.to_string()))
        })
        .collect::<Result<Vec<TargetGroup>, _>>()?;

    for group in &groups {
        tracing::info!(instance = %instance, "Waiting until instance is healthy in {}", group.arn);
        wait_until_healthy(instance, group, &target.health, health).await?;
        tracing::info!(instance = %instance, "Instance is healthy in {}", group.arn);
    }

    let signal = ResourceSignal {
        stack_name: target.stack_name.clone(),
        logical_resource_id: target.logical_resource_id.clone(),
        unique_id: instance.clone(),
        status: SignalStatus::Success,
    };
    tracing::info!(instance = %instance, "Sending signal to {}", target.stack_name);
    stack.signal_resource(&signal).await?;
    Ok(signal)
}

async fn wait_until_healthy<H>(
    instance: &InstanceId,
    group: &TargetGroup,
    policy: &PollPolicy,
    health: &H,
) -> Result<(), DeployError>
where
    H: HealthOps + ?Sized,
{
    let polled = poll_until(policy, |attempt| async move {
        match health.target_health(&group.arn, instance, group.port).await {
            Ok(TargetHealthState::Healthy) => Ok(Probe::Ready(())),
            Ok(state) => {
                tracing::debug!(instance = %instance, attempt, ?state, "target not healthy yet");
                Ok(Probe::Pending)
            }
            // Not registered yet, or throttled: both clear up on their own.
            Err(HealthError::InvalidTarget(_)) | Err(HealthError::Throttled(_)) => {
                Ok(Probe::Pending)
            }
            Err(e) => Err(DeployError::from(e)),
        }
    })
    .await?;

    match polled {
        Polled::Ready { .. } => Ok(()),
        Polled::Exhausted { attempts } => Err(DeployError::HealthTimeout {
            instance: instance.to_string(),
            target_group: group.arn.to_string(),
            attempts,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_launch_event() {
        let event = LaunchEvent::from_json(
            r#"{"detail-type": "EC2 Instance Launch Successful", "detail": {"EC2InstanceId": "i-0abc", "AutoScalingGroupName": "web"}}"#,
        )
        .unwrap();
        assert_eq!(event.instance_id().as_str(), "i-0abc");
    }
}
