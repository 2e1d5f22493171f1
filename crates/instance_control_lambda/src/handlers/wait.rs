use instance_control_core::error::{ControllerError, Transition};
use instance_control_core::instance::{InstanceSnapshot, InstanceState};
use instance_control_core::poll::PollPolicy;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::adapters::compute::ComputeApi;
use crate::adapters::observer::InvocationObserver;

pub struct StateWait<'a> {
    pub instance_id: &'a str,
    pub desired: InstanceState,
    pub transition: Transition,
    pub policy: PollPolicy,
}

/// Polls until the instance reports `desired`, making at most
/// `policy.max_attempts` state checks.
pub async fn wait_for_state(
    wait: &StateWait<'_>,
    api: &dyn ComputeApi,
    cancel: &CancellationToken,
    observer: &dyn InvocationObserver,
) -> Result<InstanceSnapshot, ControllerError> {
    let cancelled = || ControllerError::Cancelled {
        instance_id: wait.instance_id.to_string(),
    };

    observer.info(
        "state_wait_started",
        json!({
            "instance_id": wait.instance_id,
            "desired_state": wait.desired,
            "max_attempts": wait.policy.max_attempts,
            "interval_secs": wait.policy.interval.as_secs(),
            "wait_budget_secs": wait.policy.wait_budget().as_secs(),
        }),
    );

    for attempt in 1..=wait.policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let snapshot = api.describe_instance(wait.instance_id).await?;
        observer.info(
            "state_polled",
            json!({
                "instance_id": wait.instance_id,
                "attempt": attempt,
                "max_attempts": wait.policy.max_attempts,
                "state": snapshot.state,
                "desired_state": wait.desired,
            }),
        );
        if snapshot.state == wait.desired {
            return Ok(snapshot);
        }

        if attempt < wait.policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(wait.policy.interval) => {}
            }
        }
    }

    Err(ControllerError::StateTransitionTimeout {
        instance_id: wait.instance_id.to_string(),
        transition: wait.transition,
        attempts: wait.policy.max_attempts,
    })
}
