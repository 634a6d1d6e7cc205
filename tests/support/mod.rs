// ABOUTME: Test support utilities.
// ABOUTME: Tracing setup plus builders for requests, fleets, and pipeline jobs.

use fleetroll::cloud::{FleetDescription, FleetInstance, LifecycleState};
use fleetroll::pipeline::{PipelineEvent, PipelineJob};
use fleetroll::resource::CustomResourceRequest;
use fleetroll::types::InstanceId;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("fleetroll=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A custom-resource request with string properties.
#[allow(dead_code)]
pub fn request(kind: &str, props: &[(&str, &str)]) -> CustomResourceRequest {
    let properties: serde_json::Map<String, serde_json::Value> = props
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
        .collect();
    serde_json::from_value(serde_json::json!({
        "RequestType": kind,
        "ResponseURL": "http://127.0.0.1:1/callback",
        "StackId": "arn:stack/web/1",
        "RequestId": "req-1",
        "ResourceType": "Custom::Fleet",
        "LogicalResourceId": "FleetSize",
        "ResourceProperties": properties,
    }))
    .unwrap()
}

/// A fleet with the given desired capacity and instance states.
#[allow(dead_code)]
pub fn fleet(name: &str, desired_capacity: u32, states: &[LifecycleState]) -> FleetDescription {
    FleetDescription {
        name: name.to_string(),
        arn: format!("arn:fleet/{}", name),
        desired_capacity,
        instances: states
            .iter()
            .enumerate()
            .map(|(i, state)| FleetInstance {
                id: InstanceId::new(format!("i-{:04}", i)),
                lifecycle_state: state.clone(),
            })
            .collect(),
    }
}

/// A pipeline job reading `pipeline/in.zip` and writing `pipeline/out.zip`.
#[allow(dead_code)]
pub fn job(id: &str, user_parameters: serde_json::Value) -> PipelineJob {
    let event = serde_json::json!({
        "CodePipeline.job": {
            "id": id,
            "accountId": "111111111111",
            "data": {
                "actionConfiguration": {
                    "configuration": {
                        "FunctionName": "fleetroll",
                        "UserParameters": user_parameters.to_string(),
                    }
                },
                "inputArtifacts": [{
                    "name": "Source",
                    "location": {"type": "S3", "s3Location": {"bucketName": "pipeline", "objectKey": "in.zip"}}
                }],
                "outputArtifacts": [{
                    "name": "Template",
                    "location": {"type": "S3", "s3Location": {"bucketName": "pipeline", "objectKey": "out.zip"}}
                }]
            }
        }
    });
    serde_json::from_value::<PipelineEvent>(event).unwrap().job
}
