//! Scripted compute API and recording observer for handler tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use instance_control_core::error::ControllerError;
use instance_control_core::instance::{InstanceSnapshot, InstanceState, StateChange};

use crate::adapters::compute::ComputeApi;
use crate::adapters::observer::InvocationObserver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Describe(String),
    DescribeActive,
    Start(String),
    Stop(String),
    ModifyType {
        instance_id: String,
        instance_type: String,
    },
}

/// Single-instance fake. Each describe pops the next scripted state and the
/// last one repeats once the script runs out.
pub struct ScriptedComputeApi {
    instance_id: String,
    instance_type: Mutex<String>,
    states: Mutex<VecDeque<InstanceState>>,
    active_instances: Vec<InstanceSnapshot>,
    failing_operation: Option<&'static str>,
    ignore_modify: bool,
    calls: Mutex<Vec<ApiCall>>,
}

impl ScriptedComputeApi {
    pub fn new(instance_id: &str, instance_type: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            instance_type: Mutex::new(instance_type.to_string()),
            states: Mutex::new(VecDeque::from([InstanceState::Running])),
            active_instances: Vec::new(),
            failing_operation: None,
            ignore_modify: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_states(self, states: impl IntoIterator<Item = InstanceState>) -> Self {
        *self.states.lock().expect("poisoned mutex") = states.into_iter().collect();
        self
    }

    pub fn with_active_instances(mut self, instances: Vec<InstanceSnapshot>) -> Self {
        self.active_instances = instances;
        self
    }

    /// `operation` is one of `describe`, `describe_active`, `start`, `stop`, `modify`.
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.failing_operation = Some(operation);
        self
    }

    /// Modify calls succeed but leave the type untouched.
    pub fn ignoring_modify(mut self) -> Self {
        self.ignore_modify = true;
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn describe_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::Describe(_)))
            .count()
    }

    /// Calls other than describes, in order.
    pub fn lifecycle_calls(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, ApiCall::Describe(_) | ApiCall::DescribeActive))
            .collect()
    }

    pub fn current_type(&self) -> String {
        self.instance_type.lock().expect("poisoned mutex").clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().expect("poisoned mutex").push(call);
    }

    fn check(
        &self,
        operation: &'static str,
        instance_id: Option<&str>,
    ) -> Result<(), ControllerError> {
        if self.failing_operation == Some(operation) {
            return Err(ControllerError::upstream(format!(
                "{operation} failed: simulated outage"
            )));
        }
        match instance_id {
            Some(id) if id != self.instance_id => Err(ControllerError::upstream(format!(
                "{operation} failed: InvalidInstanceID.NotFound {id}"
            ))),
            _ => Ok(()),
        }
    }

    fn next_state(&self) -> InstanceState {
        let mut states = self.states.lock().expect("poisoned mutex");
        if states.len() > 1 {
            states.pop_front().unwrap_or(InstanceState::Running)
        } else {
            states.front().copied().unwrap_or(InstanceState::Running)
        }
    }

    fn acknowledgement(&self, previous: &str, current: &str) -> StateChange {
        StateChange {
            instance_id: self.instance_id.clone(),
            previous_state: Some(previous.to_string()),
            current_state: Some(current.to_string()),
        }
    }
}

#[async_trait]
impl ComputeApi for ScriptedComputeApi {
    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceSnapshot, ControllerError> {
        self.record(ApiCall::Describe(instance_id.to_string()));
        self.check("describe", Some(instance_id))?;
        Ok(InstanceSnapshot {
            id: self.instance_id.clone(),
            state: self.next_state(),
            instance_type: self.current_type(),
        })
    }

    async fn describe_active_instances(&self) -> Result<Vec<InstanceSnapshot>, ControllerError> {
        self.record(ApiCall::DescribeActive);
        self.check("describe_active", None)?;
        Ok(self.active_instances.clone())
    }

    async fn start_instance(&self, instance_id: &str) -> Result<StateChange, ControllerError> {
        self.record(ApiCall::Start(instance_id.to_string()));
        self.check("start", Some(instance_id))?;
        Ok(self.acknowledgement("stopped", "pending"))
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<StateChange, ControllerError> {
        self.record(ApiCall::Stop(instance_id.to_string()));
        self.check("stop", Some(instance_id))?;
        Ok(self.acknowledgement("running", "stopping"))
    }

    async fn modify_instance_type(
        &self,
        instance_id: &str,
        instance_type: &str,
    ) -> Result<(), ControllerError> {
        self.record(ApiCall::ModifyType {
            instance_id: instance_id.to_string(),
            instance_type: instance_type.to_string(),
        });
        self.check("modify", Some(instance_id))?;
        if self.ignore_modify {
            return Ok(());
        }
        *self.instance_type.lock().expect("poisoned mutex") = instance_type.to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservedEvent {
    pub level: &'static str,
    pub event: String,
    pub details: Value,
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().expect("poisoned mutex").clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.event).collect()
    }

    pub fn find(&self, name: &str) -> Option<ObservedEvent> {
        self.events().into_iter().find(|event| event.event == name)
    }

    fn push(&self, level: &'static str, event: &str, details: Value) {
        self.events
            .lock()
            .expect("poisoned mutex")
            .push(ObservedEvent {
                level,
                event: event.to_string(),
                details,
            });
    }
}

impl InvocationObserver for RecordingObserver {
    fn info(&self, event: &str, details: Value) {
        self.push("info", event, details);
    }

    fn error(&self, event: &str, details: Value) {
        self.push("error", event, details);
    }
}
