// ABOUTME: Integration tests for waiting on draining fleet instances.
// ABOUTME: Immediate return, waiting through Terminating:Wait, throttling, and exhaustion.

mod support;

use async_trait::async_trait;
use fleetroll::cloud::{FleetDescription, FleetError, FleetOps, LifecycleState, MemoryCloud, World};
use fleetroll::deploy::{
    DeployError, DeployErrorKind, FLEET_ARN, FleetDefaults, PollPolicy, await_drain,
    handle_drain_request,
};
use fleetroll::resource::{RecordingTransport, ResponseStatus};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use support::{fleet, request};

const FAST: PollPolicy = PollPolicy::new(Duration::ZERO, 5);

#[derive(Clone)]
enum Step {
    Describe(Option<FleetDescription>),
    Throttle,
    Fail,
}

/// A fleet whose description changes between calls. The last step repeats.
struct ScriptedFleet {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<u32>,
}

impl ScriptedFleet {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl FleetOps for ScriptedFleet {
    async fn describe_fleet(&self, _name: &str) -> Result<Option<FleetDescription>, FleetError> {
        *self.calls.lock() += 1;
        let step = {
            let mut steps = self.steps.lock();
            if steps.len() > 1 {
                steps.pop_front()
            } else {
                steps.front().cloned()
            }
        };
        match step {
            Some(Step::Describe(description)) => Ok(description),
            Some(Step::Throttle) => Err(FleetError::Throttled("Rate exceeded".to_string())),
            Some(Step::Fail) | None => Err(FleetError::Service("boom".to_string())),
        }
    }
}

fn draining() -> Step {
    Step::Describe(Some(fleet(
        "web",
        2,
        &[LifecycleState::InService, LifecycleState::TerminatingWait],
    )))
}

fn settled() -> Step {
    Step::Describe(Some(fleet(
        "web",
        2,
        &[LifecycleState::InService, LifecycleState::InService],
    )))
}

mod waiting {
    use super::*;

    #[tokio::test]
    async fn returns_immediately_when_nothing_drains() {
        support::init_tracing();
        let fleet = ScriptedFleet::new(vec![settled()]);

        let arn = await_drain("web", &fleet, &FAST).await.unwrap();

        assert_eq!(arn, "arn:fleet/web");
        assert_eq!(fleet.calls(), 1);
    }

    #[tokio::test]
    async fn waits_until_terminating_wait_clears() {
        let fleet = ScriptedFleet::new(vec![draining(), draining(), settled()]);

        let arn = await_drain("web", &fleet, &FAST).await.unwrap();

        assert_eq!(arn, "arn:fleet/web");
        assert_eq!(fleet.calls(), 3);
    }

    #[tokio::test]
    async fn other_terminating_states_do_not_block() {
        let fleet = ScriptedFleet::new(vec![Step::Describe(Some(fleet(
            "web",
            1,
            &[LifecycleState::Terminating, LifecycleState::TerminatingProceed],
        )))]);

        assert_eq!(await_drain("web", &fleet, &FAST).await.unwrap(), "arn:fleet/web");
    }

    #[tokio::test]
    async fn missing_fleet_yields_empty_identifier() {
        let cloud = MemoryCloud::new(World::default());

        let arn = await_drain("web", &cloud, &FAST).await.unwrap();

        assert_eq!(arn, "");
    }

    #[tokio::test]
    async fn throttling_counts_as_a_pending_attempt() {
        let fleet = ScriptedFleet::new(vec![Step::Throttle, Step::Throttle, settled()]);

        assert_eq!(await_drain("web", &fleet, &FAST).await.unwrap(), "arn:fleet/web");
        assert_eq!(fleet.calls(), 3);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn exhaustion_is_a_drain_timeout() {
        let fleet = ScriptedFleet::new(vec![draining()]);

        let err = await_drain("web", &fleet, &FAST).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::DrainTimeout { ref fleet, attempts: 5 } if fleet == "web"
        ));
        assert_eq!(err.kind(), DeployErrorKind::Transient);
        assert_eq!(fleet.calls(), 5);
    }

    #[tokio::test]
    async fn service_errors_end_the_wait() {
        let fleet = ScriptedFleet::new(vec![draining(), Step::Fail]);

        let err = await_drain("web", &fleet, &FAST).await.unwrap_err();

        assert!(matches!(err, DeployError::Fleet(_)));
        assert_eq!(fleet.calls(), 2);
    }
}

mod responses {
    use super::*;

    fn defaults() -> FleetDefaults {
        FleetDefaults {
            name: Some("web".to_string()),
            default_image_parameter: None,
        }
    }

    #[tokio::test]
    async fn success_reports_fleet_identifier() {
        let cloud = MemoryCloud::new(
            World::default().with_fleet(fleet("web", 1, &[LifecycleState::InService])),
        );
        let transport = Arc::new(RecordingTransport::new());

        let response = handle_drain_request(
            request("Update", &[]),
            &defaults(),
            &FAST,
            &cloud,
            transport.clone(),
        )
        .await
        .unwrap();

        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.data[FLEET_ARN], "arn:fleet/web");
        assert_eq!(transport.responses().len(), 1);
    }

    #[tokio::test]
    async fn delete_requests_still_wait() {
        let fleet = ScriptedFleet::new(vec![draining(), settled()]);
        let transport = Arc::new(RecordingTransport::new());

        let response = handle_drain_request(
            request("Delete", &[]),
            &defaults(),
            &FAST,
            &fleet,
            transport.clone(),
        )
        .await
        .unwrap();

        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(fleet.calls(), 2);
    }

    #[tokio::test]
    async fn timeout_sends_failed_response() {
        let fleet = ScriptedFleet::new(vec![draining()]);
        let transport = Arc::new(RecordingTransport::new());

        let response = handle_drain_request(
            request("Update", &[]),
            &defaults(),
            &FAST,
            &fleet,
            transport.clone(),
        )
        .await
        .unwrap();

        assert_eq!(response.status, ResponseStatus::Failed);
        assert!(response.data.is_empty());
        assert_eq!(transport.responses(), vec![response]);
    }

    #[tokio::test]
    async fn request_property_names_the_fleet() {
        let cloud = MemoryCloud::new(World::default().with_fleet(fleet("api", 1, &[])));
        let transport = Arc::new(RecordingTransport::new());

        let response = handle_drain_request(
            request("Update", &[("AutoScalingGroupName", "api")]),
            &FleetDefaults::default(),
            &FAST,
            &cloud,
            transport,
        )
        .await
        .unwrap();

        assert_eq!(response.data[FLEET_ARN], "arn:fleet/api");
    }

    #[tokio::test]
    async fn no_fleet_name_anywhere_fails() {
        let cloud = MemoryCloud::new(World::default());
        let transport = Arc::new(RecordingTransport::new());

        let response = handle_drain_request(
            request("Update", &[]),
            &FleetDefaults::default(),
            &FAST,
            &cloud,
            transport,
        )
        .await
        .unwrap();

        assert_eq!(response.status, ResponseStatus::Failed);
        assert!(response.reason.contains("AutoScalingGroupName"));
    }
}
