use instance_control_core::contract::{Action, DirectActionRequest, InvocationResult};
use instance_control_core::error::ControllerError;
use serde_json::{json, Value};

use crate::adapters::compute::ComputeApi;
use crate::adapters::observer::InvocationObserver;

/// Start or stop one instance. Never fails: every error becomes a 400 result
/// and is logged together with the triggering event. `resize` is rejected
/// here; that action belongs to the resize handler.
pub async fn handle_dispatch_event(
    event: &Value,
    api: &dyn ComputeApi,
    observer: &dyn InvocationObserver,
) -> InvocationResult {
    match dispatch(event, api, observer).await {
        Ok(result) => result,
        Err(error) => {
            observer.error(
                "dispatch_failed",
                json!({
                    "error": error.to_string(),
                    "kind": error.kind(),
                    "event": event,
                }),
            );
            InvocationResult::client_error(&error)
        }
    }
}

async fn dispatch(
    event: &Value,
    api: &dyn ComputeApi,
    observer: &dyn InvocationObserver,
) -> Result<InvocationResult, ControllerError> {
    let request = DirectActionRequest::from_event(event)?;
    let instance_id = request.instance_id.as_str();

    let (acknowledgement, message) = match request.action {
        Action::Start => (
            api.start_instance(instance_id).await?,
            format!("Started instance {instance_id}"),
        ),
        Action::Stop => (
            api.stop_instance(instance_id).await?,
            format!("Stopped instance {instance_id}"),
        ),
        Action::Resize => {
            return Err(ControllerError::invalid_request(
                "Invalid action: resize is handled by the resize handler",
            ));
        }
    };

    observer.info(
        "action_acknowledged",
        json!({
            "action": request.action.as_str(),
            "instance_id": instance_id,
            "response": acknowledgement,
        }),
    );

    Ok(InvocationResult::ok_message(&message, Some(instance_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ApiCall, RecordingObserver, ScriptedComputeApi};

    #[tokio::test]
    async fn start_issues_exactly_one_call() {
        let api = ScriptedComputeApi::new("i-0abc", "t3.micro");
        let observer = RecordingObserver::new();

        let result = handle_dispatch_event(
            &json!({"action": "start", "instance": "i-0abc"}),
            &api,
            &observer,
        )
        .await;

        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, "\"Started instance i-0abc\"");
        assert_eq!(result.instance_id.as_deref(), Some("i-0abc"));
        assert_eq!(api.calls(), vec![ApiCall::Start("i-0abc".to_string())]);
    }

    #[tokio::test]
    async fn stop_logs_acknowledgement_verbatim() {
        let api = ScriptedComputeApi::new("i-0abc", "t3.micro");
        let observer = RecordingObserver::new();

        let result = handle_dispatch_event(
            &json!({"action": "stop", "instance": "i-0abc"}),
            &api,
            &observer,
        )
        .await;

        assert_eq!(result.status_code, 200);
        assert_eq!(api.calls(), vec![ApiCall::Stop("i-0abc".to_string())]);
        let logged = observer
            .find("action_acknowledged")
            .expect("acknowledgement is logged");
        assert_eq!(logged.details["response"]["current_state"], "stopping");
    }

    #[tokio::test]
    async fn missing_instance_returns_400_without_calls() {
        let api = ScriptedComputeApi::new("i-0abc", "t3.micro");
        let observer = RecordingObserver::new();
        let event = json!({"action": "start"});

        let result = handle_dispatch_event(&event, &api, &observer).await;

        assert_eq!(result.status_code, 400);
        let body: Value = serde_json::from_str(&result.body).expect("body is json");
        assert!(!body["error"].as_str().unwrap_or_default().is_empty());
        assert!(api.calls().is_empty());

        let failure = observer.find("dispatch_failed").expect("failure is logged");
        assert_eq!(failure.level, "error");
        assert_eq!(failure.details["event"], event);
    }

    #[tokio::test]
    async fn unknown_action_returns_400_without_calls() {
        let api = ScriptedComputeApi::new("i-0abc", "t3.micro");

        let result = handle_dispatch_event(
            &json!({"action": "reboot", "instance": "i-0abc"}),
            &api,
            &RecordingObserver::new(),
        )
        .await;

        assert_eq!(result.status_code, 400);
        assert!(result.body.contains("Invalid action: reboot"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn resize_action_is_rejected_without_calls() {
        let api = ScriptedComputeApi::new("i-0abc", "t3.micro");

        let result = handle_dispatch_event(
            &json!({"action": "resize", "instance": "i-0abc"}),
            &api,
            &RecordingObserver::new(),
        )
        .await;

        assert_eq!(result.status_code, 400);
        assert!(result.body.contains("Invalid action: resize"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_softened_to_400() {
        let api = ScriptedComputeApi::new("i-0abc", "t3.micro").failing_on("start");
        let observer = RecordingObserver::new();

        let result = handle_dispatch_event(
            &json!({"action": "start", "instance": "i-0abc"}),
            &api,
            &observer,
        )
        .await;

        assert_eq!(result.status_code, 400);
        assert!(result.body.contains("simulated outage"));
        let failure = observer.find("dispatch_failed").expect("failure is logged");
        assert_eq!(failure.details["kind"], "upstream_api_error");
    }
}
