use instance_control_core::contract::{resolve_resize_target, InvocationResult, ResizeTarget};
use instance_control_core::error::{ControllerError, Transition};
use instance_control_core::instance::{InstanceSnapshot, InstanceState};
use instance_control_core::resize::{
    decide_resize, NoOpReason, ResizeDecision, ResizePlan, ResizeSummary,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::adapters::compute::ComputeApi;
use crate::adapters::observer::InvocationObserver;
use crate::config::ControllerConfig;
use crate::handlers::wait::{wait_for_state, StateWait};

/// Toggle a large instance down to the small type. Errors are logged and
/// returned so the platform records the invocation as failed.
pub async fn handle_resize_event(
    event: &Value,
    api: &dyn ComputeApi,
    config: &ControllerConfig,
    cancel: &CancellationToken,
    observer: &dyn InvocationObserver,
) -> Result<InvocationResult, ControllerError> {
    observer.info("resize_received", json!({ "event": event }));

    match resize(event, api, config, cancel, observer).await {
        Ok(summary) => {
            let body = summary.to_body();
            observer.info("resize_completed", body.clone());
            Ok(InvocationResult::ok_json(body, Some(summary.instance_id.as_str())))
        }
        Err(error) => {
            observer.error(
                "resize_failed",
                json!({
                    "error": error.to_string(),
                    "kind": error.kind(),
                    "event": event,
                }),
            );
            Err(error)
        }
    }
}

async fn resize(
    event: &Value,
    api: &dyn ComputeApi,
    config: &ControllerConfig,
    cancel: &CancellationToken,
    observer: &dyn InvocationObserver,
) -> Result<ResizeSummary, ControllerError> {
    let instance_id = resolve_instance_id(event, api, observer).await?;

    let snapshot = api.describe_instance(&instance_id).await?;
    observer.info(
        "instance_described",
        json!({
            "instance_id": snapshot.id,
            "state": snapshot.state,
            "instance_type": snapshot.instance_type,
        }),
    );

    let cycle = ResizeCycle {
        instance_id: &instance_id,
        api,
        config,
        cancel,
        observer,
    };

    match decide_resize(&snapshot) {
        ResizeDecision::AlreadyTarget => Ok(ResizeSummary::unchanged(
            &snapshot,
            NoOpReason::AlreadyTarget,
        )),
        ResizeDecision::UnsupportedType => Ok(ResizeSummary::unchanged(
            &snapshot,
            NoOpReason::UnsupportedType,
        )),
        ResizeDecision::NotActionable(_) => Ok(ResizeSummary::unchanged(
            &snapshot,
            NoOpReason::NotActionable,
        )),
        ResizeDecision::StopModifyStart(plan) => {
            cycle.stop().await?;
            cycle.modify_and_start(&plan).await
        }
        ResizeDecision::ModifyStart(plan) => cycle.modify_and_start(&plan).await,
    }
}

async fn resolve_instance_id(
    event: &Value,
    api: &dyn ComputeApi,
    observer: &dyn InvocationObserver,
) -> Result<String, ControllerError> {
    let instance_id = match resolve_resize_target(event)? {
        ResizeTarget::Explicit(instance_id) => instance_id,
        ResizeTarget::FirstActive => api
            .describe_active_instances()
            .await?
            .into_iter()
            .next()
            .map(|snapshot| snapshot.id)
            .ok_or(ControllerError::NoActiveInstance)?,
    };

    observer.info("instance_resolved", json!({ "instance_id": instance_id }));
    Ok(instance_id)
}

struct ResizeCycle<'a> {
    instance_id: &'a str,
    api: &'a dyn ComputeApi,
    config: &'a ControllerConfig,
    cancel: &'a CancellationToken,
    observer: &'a dyn InvocationObserver,
}

impl ResizeCycle<'_> {
    async fn stop(&self) -> Result<(), ControllerError> {
        let acknowledgement = self.api.stop_instance(self.instance_id).await?;
        self.observer.info(
            "stop_initiated",
            json!({ "instance_id": self.instance_id, "response": acknowledgement }),
        );
        self.wait(InstanceState::Stopped, Transition::Stop).await?;
        Ok(())
    }

    async fn modify_and_start(&self, plan: &ResizePlan) -> Result<ResizeSummary, ControllerError> {
        self.api
            .modify_instance_type(self.instance_id, &plan.target_type)
            .await?;
        self.observer.info(
            "instance_type_modified",
            json!({
                "instance_id": self.instance_id,
                "from": plan.current_type,
                "to": plan.target_type,
            }),
        );

        let acknowledgement = self.api.start_instance(self.instance_id).await?;
        self.observer.info(
            "start_initiated",
            json!({ "instance_id": self.instance_id, "response": acknowledgement }),
        );

        let snapshot = self.wait(InstanceState::Running, Transition::Start).await?;
        Ok(ResizeSummary::resized(plan, &snapshot))
    }

    async fn wait(
        &self,
        desired: InstanceState,
        transition: Transition,
    ) -> Result<InstanceSnapshot, ControllerError> {
        let wait = StateWait {
            instance_id: self.instance_id,
            desired,
            transition,
            policy: self.config.poll_policy,
        };
        wait_for_state(&wait, self.api, self.cancel, self.observer).await
    }
}
