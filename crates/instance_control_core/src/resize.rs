use serde::Serialize;
use serde_json::Value;

use crate::instance::{InstanceSnapshot, InstanceState};

pub const SMALL_INSTANCE_TYPE: &str = "t2.micro";
pub const LARGE_INSTANCE_TYPE: &str = "t3.micro";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizePlan {
    pub current_type: String,
    pub target_type: String,
}

/// What the resize handler should do with the instance it just described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeDecision {
    AlreadyTarget,
    UnsupportedType,
    StopModifyStart(ResizePlan),
    ModifyStart(ResizePlan),
    NotActionable(InstanceState),
}

/// Toggle mapping. Only the large type has a substitution.
pub fn target_instance_type(current_type: &str) -> Option<&'static str> {
    match current_type {
        LARGE_INSTANCE_TYPE => Some(SMALL_INSTANCE_TYPE),
        _ => None,
    }
}

/// Type is checked before state: a small instance is left alone whatever its state.
pub fn decide_resize(snapshot: &InstanceSnapshot) -> ResizeDecision {
    if snapshot.instance_type == SMALL_INSTANCE_TYPE {
        return ResizeDecision::AlreadyTarget;
    }

    let Some(target_type) = target_instance_type(&snapshot.instance_type) else {
        return ResizeDecision::UnsupportedType;
    };

    let plan = ResizePlan {
        current_type: snapshot.instance_type.clone(),
        target_type: target_type.to_string(),
    };

    match snapshot.state {
        InstanceState::Running => ResizeDecision::StopModifyStart(plan),
        InstanceState::Stopped => ResizeDecision::ModifyStart(plan),
        other => ResizeDecision::NotActionable(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeOutcome {
    Resized,
    AlreadyTarget,
    UnsupportedType,
    NotActionable,
}

/// Decisions that end the invocation without a lifecycle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    AlreadyTarget,
    UnsupportedType,
    NotActionable,
}

impl From<NoOpReason> for ResizeOutcome {
    fn from(reason: NoOpReason) -> Self {
        match reason {
            NoOpReason::AlreadyTarget => Self::AlreadyTarget,
            NoOpReason::UnsupportedType => Self::UnsupportedType,
            NoOpReason::NotActionable => Self::NotActionable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeSummary {
    pub instance_id: String,
    pub outcome: ResizeOutcome,
    pub state: InstanceState,
    pub instance_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_type: Option<String>,
    pub message: String,
}

impl ResizeSummary {
    /// State and type come from the final describe, not from the plan.
    pub fn resized(plan: &ResizePlan, final_snapshot: &InstanceSnapshot) -> Self {
        Self {
            instance_id: final_snapshot.id.clone(),
            outcome: ResizeOutcome::Resized,
            state: final_snapshot.state,
            instance_type: final_snapshot.instance_type.clone(),
            previous_type: Some(plan.current_type.clone()),
            message: format!(
                "Resized instance {} from {} to {}",
                final_snapshot.id, plan.current_type, final_snapshot.instance_type
            ),
        }
    }

    pub fn unchanged(snapshot: &InstanceSnapshot, reason: NoOpReason) -> Self {
        let message = match reason {
            NoOpReason::AlreadyTarget => format!(
                "Instance {} is already {}. No action taken.",
                snapshot.id, snapshot.instance_type
            ),
            NoOpReason::UnsupportedType => format!(
                "Instance {} has type {}, which has no resize mapping. No action taken.",
                snapshot.id, snapshot.instance_type
            ),
            NoOpReason::NotActionable => format!(
                "Instance {} is in {} state. No action taken.",
                snapshot.id, snapshot.state
            ),
        };

        Self {
            instance_id: snapshot.id.clone(),
            outcome: reason.into(),
            state: snapshot.state,
            instance_type: snapshot.instance_type.clone(),
            previous_type: None,
            message,
        }
    }

    pub fn to_body(&self) -> Value {
        serde_json::to_value(self).expect("resize summary should serialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: InstanceState, instance_type: &str) -> InstanceSnapshot {
        InstanceSnapshot {
            id: "i-0abc".to_string(),
            state,
            instance_type: instance_type.to_string(),
        }
    }

    #[test]
    fn running_large_instance_needs_full_cycle() {
        let decision = decide_resize(&snapshot(InstanceState::Running, "t3.micro"));
        assert_eq!(
            decision,
            ResizeDecision::StopModifyStart(ResizePlan {
                current_type: "t3.micro".to_string(),
                target_type: "t2.micro".to_string(),
            })
        );
    }

    #[test]
    fn stopped_large_instance_skips_stop() {
        let decision = decide_resize(&snapshot(InstanceState::Stopped, "t3.micro"));
        assert!(matches!(decision, ResizeDecision::ModifyStart(_)));
    }

    #[test]
    fn small_instance_is_left_alone_in_every_state() {
        for state in [
            InstanceState::Pending,
            InstanceState::Running,
            InstanceState::Stopped,
            InstanceState::Terminated,
        ] {
            assert_eq!(
                decide_resize(&snapshot(state, "t2.micro")),
                ResizeDecision::AlreadyTarget
            );
        }
    }

    #[test]
    fn unmapped_type_is_unsupported() {
        assert_eq!(
            decide_resize(&snapshot(InstanceState::Running, "m5.large")),
            ResizeDecision::UnsupportedType
        );
    }

    #[test]
    fn transitional_state_is_not_actionable() {
        assert_eq!(
            decide_resize(&snapshot(InstanceState::Stopping, "t3.micro")),
            ResizeDecision::NotActionable(InstanceState::Stopping)
        );
    }

    #[test]
    fn resized_body_reports_previous_type() {
        let plan = ResizePlan {
            current_type: "t3.micro".to_string(),
            target_type: "t2.micro".to_string(),
        };
        let body = ResizeSummary::resized(&plan, &snapshot(InstanceState::Running, "t2.micro"))
            .to_body();

        assert_eq!(body["outcome"], Value::from("resized"));
        assert_eq!(body["state"], Value::from("running"));
        assert_eq!(body["instance_type"], Value::from("t2.micro"));
        assert_eq!(body["previous_type"], Value::from("t3.micro"));
    }

    #[test]
    fn resized_summary_reports_type_the_api_returned() {
        let plan = ResizePlan {
            current_type: "t3.micro".to_string(),
            target_type: "t2.micro".to_string(),
        };
        let summary = ResizeSummary::resized(&plan, &snapshot(InstanceState::Running, "t3.micro"));

        assert_eq!(summary.instance_type, "t3.micro");
        assert_eq!(summary.message, "Resized instance i-0abc from t3.micro to t3.micro");
    }

    #[test]
    fn each_no_op_reason_has_its_own_outcome_and_message() {
        let small = snapshot(InstanceState::Running, "t2.micro");
        let already = ResizeSummary::unchanged(&small, NoOpReason::AlreadyTarget);
        assert_eq!(already.outcome, ResizeOutcome::AlreadyTarget);
        assert!(already.message.contains("already t2.micro"));

        let odd = snapshot(InstanceState::Running, "m5.large");
        let unsupported = ResizeSummary::unchanged(&odd, NoOpReason::UnsupportedType);
        assert_eq!(unsupported.outcome, ResizeOutcome::UnsupportedType);
        assert!(unsupported.message.contains("no resize mapping"));
    }

    #[test]
    fn not_actionable_message_names_state() {
        let summary = ResizeSummary::unchanged(
            &snapshot(InstanceState::ShuttingDown, "t3.micro"),
            NoOpReason::NotActionable,
        );
        assert_eq!(summary.outcome, ResizeOutcome::NotActionable);
        assert!(summary.message.contains("shutting-down"));
        assert!(summary.to_body().get("previous_type").is_none());
    }
}
