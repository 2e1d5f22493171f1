use std::time::Duration;

use instance_control_core::error::{ControllerError, Transition};
use instance_control_core::instance::InstanceState;
use instance_control_core::poll::PollPolicy;
use instance_control_lambda::config::ControllerConfig;
use instance_control_lambda::handlers::dispatch::handle_dispatch_event;
use instance_control_lambda::handlers::resize::handle_resize_event;
use instance_control_lambda::test_support::{ApiCall, RecordingObserver, ScriptedComputeApi};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

fn zero_interval_config() -> ControllerConfig {
    ControllerConfig {
        poll_policy: PollPolicy::new(Duration::ZERO, 30),
    }
}

fn alarm_notification(instance_id: &str) -> Value {
    let message = json!({
        "AlarmName": "instance-cpu-credit-low",
        "NewStateValue": "ALARM",
        "Trigger": {
            "MetricName": "CPUCreditBalance",
            "Namespace": "AWS/EC2",
            "Dimensions": [{"name": "InstanceId", "value": instance_id}]
        }
    });
    json!({
        "Records": [{
            "EventSource": "aws:sns",
            "EventVersion": "1.0",
            "Sns": {
                "Type": "Notification",
                "Subject": "ALARM",
                "Message": message.to_string()
            }
        }]
    })
}

#[tokio::test]
async fn dispatch_rejects_incomplete_requests_without_api_calls() {
    for event in [
        json!({}),
        json!({"action": "stop"}),
        json!({"instance": "i-abc123"}),
        json!({"action": "hibernate", "instance": "i-abc123"}),
    ] {
        let api = ScriptedComputeApi::new("i-abc123", "t3.micro");
        let result = handle_dispatch_event(&event, &api, &RecordingObserver::new()).await;

        assert_eq!(result.status_code, 400, "event {event} should be rejected");
        assert!(api.calls().is_empty());
    }
}

#[tokio::test]
async fn dispatch_start_and_stop_are_symmetric() {
    for (action, expected_call) in [
        ("start", ApiCall::Start("i-abc123".to_string())),
        ("stop", ApiCall::Stop("i-abc123".to_string())),
    ] {
        let api = ScriptedComputeApi::new("i-abc123", "t3.micro");
        let result = handle_dispatch_event(
            &json!({"action": action, "instance": "i-abc123"}),
            &api,
            &RecordingObserver::new(),
        )
        .await;

        assert_eq!(result.status_code, 200);
        assert_eq!(api.calls(), vec![expected_call]);
    }
}

#[tokio::test]
async fn alarm_notification_drives_full_resize_cycle() {
    let api = ScriptedComputeApi::new("i-abc123", "t3.micro").with_states([
        InstanceState::Running,
        InstanceState::Stopping,
        InstanceState::Stopped,
        InstanceState::Pending,
        InstanceState::Running,
    ]);
    let observer = RecordingObserver::new();

    let result = handle_resize_event(
        &alarm_notification("i-abc123"),
        &api,
        &zero_interval_config(),
        &CancellationToken::new(),
        &observer,
    )
    .await
    .expect("resize should succeed");

    assert_eq!(
        api.calls(),
        vec![
            ApiCall::Describe("i-abc123".to_string()),
            ApiCall::Stop("i-abc123".to_string()),
            ApiCall::Describe("i-abc123".to_string()),
            ApiCall::Describe("i-abc123".to_string()),
            ApiCall::ModifyType {
                instance_id: "i-abc123".to_string(),
                instance_type: "t2.micro".to_string(),
            },
            ApiCall::Start("i-abc123".to_string()),
            ApiCall::Describe("i-abc123".to_string()),
            ApiCall::Describe("i-abc123".to_string()),
        ]
    );

    let body: Value = serde_json::from_str(&result.body).expect("body is json");
    assert_eq!(body["state"], "running");
    assert_eq!(body["instance_type"], "t2.micro");
    assert_eq!(result.instance_id.as_deref(), Some("i-abc123"));

    let names = observer.event_names();
    assert_eq!(names.first().map(String::as_str), Some("resize_received"));
    assert_eq!(names.last().map(String::as_str), Some("resize_completed"));
}

#[tokio::test]
async fn notification_and_direct_id_reach_the_same_instance() {
    let notified = ScriptedComputeApi::new("i-abc123", "t2.micro");
    let direct = ScriptedComputeApi::new("i-abc123", "t2.micro");

    let from_alarm = handle_resize_event(
        &alarm_notification("i-abc123"),
        &notified,
        &zero_interval_config(),
        &CancellationToken::new(),
        &RecordingObserver::new(),
    )
    .await
    .expect("alarm resize should succeed");
    let from_field = handle_resize_event(
        &json!({"instance_id": "i-abc123"}),
        &direct,
        &zero_interval_config(),
        &CancellationToken::new(),
        &RecordingObserver::new(),
    )
    .await
    .expect("direct resize should succeed");

    assert_eq!(from_alarm, from_field);
    assert_eq!(notified.calls(), direct.calls());
}

#[tokio::test]
async fn resize_stop_timeout_checks_state_exactly_thirty_times() {
    let api = ScriptedComputeApi::new("i-abc123", "t3.micro")
        .with_states([InstanceState::Running, InstanceState::Stopping]);

    let error = handle_resize_event(
        &json!({"instance_id": "i-abc123"}),
        &api,
        &zero_interval_config(),
        &CancellationToken::new(),
        &RecordingObserver::new(),
    )
    .await
    .expect_err("stop should time out");

    assert!(matches!(
        error,
        ControllerError::StateTransitionTimeout {
            transition: Transition::Stop,
            attempts: 30,
            ..
        }
    ));
    let polls_after_stop = api
        .calls()
        .into_iter()
        .skip_while(|call| !matches!(call, ApiCall::Stop(_)))
        .filter(|call| matches!(call, ApiCall::Describe(_)))
        .count();
    assert_eq!(polls_after_stop, 30);
    assert!(!api
        .calls()
        .iter()
        .any(|call| matches!(call, ApiCall::ModifyType { .. } | ApiCall::Start(_))));
}
