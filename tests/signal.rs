// ABOUTME: Integration tests for signalling the stack once an instance is healthy.
// ABOUTME: Gating on every target group, missing groups, and health timeouts.

mod support;

use fleetroll::cloud::{MemoryCloud, SignalStatus, TargetHealthState, World};
use fleetroll::deploy::{
    DeployError, DeployErrorKind, LaunchEvent, PollPolicy, SignalTarget, signal_when_healthy,
};
use fleetroll::types::{InstanceId, TargetGroupArn};
use nonempty::NonEmpty;
use std::time::Duration;

use TargetHealthState::{Healthy, Initial, Unhealthy};

fn target(groups: &[&str], max_attempts: u32) -> SignalTarget {
    let arns: Vec<TargetGroupArn> = groups.iter().map(|g| TargetGroupArn::new(*g)).collect();
    SignalTarget {
        stack_name: "web-stack".to_string(),
        logical_resource_id: "Fleet".to_string(),
        target_groups: NonEmpty::from_vec(arns).unwrap(),
        health: PollPolicy::new(Duration::ZERO, max_attempts),
    }
}

fn world() -> World {
    World::default()
        .with_stack("web-stack", "{}", &[])
        .with_target_group("tg/public", 80)
        .with_target_group("tg/admin", 8080)
}

fn instance() -> InstanceId {
    InstanceId::new("i-0abc")
}

mod healthy {
    use super::*;

    #[tokio::test]
    async fn signals_once_after_every_group_is_healthy() {
        support::init_tracing();
        let cloud = MemoryCloud::new(
            world()
                .with_target_health("tg/public", "i-0abc", vec![Initial, Initial, Healthy])
                .with_target_health("tg/admin", "i-0abc", vec![Unhealthy, Healthy]),
        );

        let signal = signal_when_healthy(
            &instance(),
            &target(&["tg/public", "tg/admin"], 10),
            &cloud,
            &cloud,
        )
        .await
        .unwrap();

        assert_eq!(signal.status, SignalStatus::Success);
        assert_eq!(signal.unique_id, instance());
        assert_eq!(signal.logical_resource_id, "Fleet");
        assert_eq!(cloud.snapshot().signals, vec![signal]);
    }

    #[tokio::test]
    async fn unregistered_target_is_retried() {
        let cloud = MemoryCloud::new(world());
        let tg = TargetGroupArn::new("tg/public");

        let handle = {
            let cloud = cloud.clone();
            tokio::spawn(async move {
                signal_when_healthy(
                    &instance(),
                    &SignalTarget {
                        health: PollPolicy::new(Duration::from_millis(5), 200),
                        ..target(&["tg/public"], 1)
                    },
                    &cloud,
                    &cloud,
                )
                .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cloud.with_world(|w| {
            w.target_groups
                .get_mut(tg.as_str())
                .unwrap()
                .targets
                .insert("i-0abc".to_string(), vec![Healthy]);
        });

        let signal = handle.await.unwrap().unwrap();
        assert_eq!(signal.status, SignalStatus::Success);
        assert_eq!(cloud.snapshot().signals.len(), 1);
    }

    #[tokio::test]
    async fn throttled_health_checks_are_retried() {
        let cloud = MemoryCloud::new(
            world().with_target_health("tg/public", "i-0abc", vec![Healthy]),
        );
        cloud.fail_next("target_health", "Rate exceeded");

        signal_when_healthy(&instance(), &target(&["tg/public"], 3), &cloud, &cloud)
            .await
            .unwrap();

        assert_eq!(cloud.snapshot().signals.len(), 1);
    }

    #[test]
    fn launch_event_names_the_instance() {
        let event = LaunchEvent::from_json(
            &serde_json::json!({"detail": {"EC2InstanceId": "i-0abc"}}).to_string(),
        )
        .unwrap();

        assert_eq!(event.instance_id(), &instance());
    }
}

mod unhealthy {
    use super::*;

    #[tokio::test]
    async fn timeout_sends_no_signal() {
        let cloud = MemoryCloud::new(
            world()
                .with_target_health("tg/public", "i-0abc", vec![Healthy])
                .with_target_health("tg/admin", "i-0abc", vec![Unhealthy]),
        );

        let err = signal_when_healthy(
            &instance(),
            &target(&["tg/public", "tg/admin"], 4),
            &cloud,
            &cloud,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DeployError::HealthTimeout { ref target_group, attempts: 4, .. } if target_group == "tg/admin"
        ));
        assert_eq!(err.kind(), DeployErrorKind::Transient);
        assert!(cloud.snapshot().signals.is_empty());
    }

    #[tokio::test]
    async fn missing_target_group_sends_no_signal() {
        let cloud = MemoryCloud::new(
            world().with_target_health("tg/public", "i-0abc", vec![Healthy]),
        );

        let err = signal_when_healthy(
            &instance(),
            &target(&["tg/public", "tg/gone"], 4),
            &cloud,
            &cloud,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::Health(_) | DeployError::MissingTargetGroup(_)));
        assert!(cloud.snapshot().signals.is_empty());
    }

    #[tokio::test]
    async fn signal_failure_is_reported() {
        let cloud = MemoryCloud::new(
            World::default()
                .with_target_group("tg/public", 80)
                .with_target_health("tg/public", "i-0abc", vec![Healthy]),
        );

        let err = signal_when_healthy(&instance(), &target(&["tg/public"], 2), &cloud, &cloud)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Stack(_)));
    }
}
