use async_trait::async_trait;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{AttributeValue, Filter, Instance, InstanceStateChange};
use instance_control_core::error::ControllerError;
use instance_control_core::instance::{InstanceSnapshot, InstanceState, StateChange};

use crate::adapters::compute::ComputeApi;

pub struct Ec2ComputeApi {
    client: aws_sdk_ec2::Client,
}

impl Ec2ComputeApi {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }

    /// Region and credentials come from the default provider chain.
    pub async fn from_env() -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_ec2::Client::new(&aws_config))
    }
}

#[async_trait]
impl ComputeApi for Ec2ComputeApi {
    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceSnapshot, ControllerError> {
        let output = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|error| upstream_error("describe_instances", error))?;

        let instance = output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .next()
            .ok_or_else(|| {
                ControllerError::upstream(format!(
                    "describe_instances returned no instance for {instance_id}"
                ))
            })?;

        snapshot_from_instance(instance)
    }

    async fn describe_active_instances(&self) -> Result<Vec<InstanceSnapshot>, ControllerError> {
        let filter = Filter::builder()
            .name("instance-state-name")
            .set_values(Some(
                InstanceState::ACTIVE
                    .iter()
                    .map(|state| state.as_str().to_string())
                    .collect(),
            ))
            .build();

        let output = self
            .client
            .describe_instances()
            .filters(filter)
            .send()
            .await
            .map_err(|error| upstream_error("describe_instances", error))?;

        output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .map(snapshot_from_instance)
            .collect()
    }

    async fn start_instance(&self, instance_id: &str) -> Result<StateChange, ControllerError> {
        let output = self
            .client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|error| upstream_error("start_instances", error))?;

        acknowledgement(instance_id, output.starting_instances())
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<StateChange, ControllerError> {
        let output = self
            .client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|error| upstream_error("stop_instances", error))?;

        acknowledgement(instance_id, output.stopping_instances())
    }

    async fn modify_instance_type(
        &self,
        instance_id: &str,
        instance_type: &str,
    ) -> Result<(), ControllerError> {
        self.client
            .modify_instance_attribute()
            .instance_id(instance_id)
            .instance_type(AttributeValue::builder().value(instance_type).build())
            .send()
            .await
            .map(|_| ())
            .map_err(|error| upstream_error("modify_instance_attribute", error))
    }
}

fn upstream_error(operation: &str, error: impl std::error::Error) -> ControllerError {
    ControllerError::upstream(format!("{operation} failed: {}", DisplayErrorContext(error)))
}

fn snapshot_from_instance(instance: &Instance) -> Result<InstanceSnapshot, ControllerError> {
    let id = instance
        .instance_id()
        .ok_or_else(|| ControllerError::upstream("instance is missing an id"))?;
    let state_name = instance
        .state()
        .and_then(|state| state.name())
        .ok_or_else(|| ControllerError::upstream(format!("instance {id} is missing a state")))?;
    let instance_type = instance
        .instance_type()
        .ok_or_else(|| ControllerError::upstream(format!("instance {id} is missing a type")))?;

    Ok(InstanceSnapshot {
        id: id.to_string(),
        state: state_name.as_str().parse()?,
        instance_type: instance_type.as_str().to_string(),
    })
}

fn acknowledgement(
    instance_id: &str,
    changes: &[InstanceStateChange],
) -> Result<StateChange, ControllerError> {
    let change = changes
        .iter()
        .find(|change| change.instance_id() == Some(instance_id))
        .ok_or_else(|| {
            ControllerError::upstream(format!(
                "state change acknowledgement missing for {instance_id}"
            ))
        })?;

    Ok(StateChange {
        instance_id: instance_id.to_string(),
        previous_state: change
            .previous_state()
            .and_then(|state| state.name())
            .map(|name| name.as_str().to_string()),
        current_state: change
            .current_state()
            .and_then(|state| state.name())
            .map(|name| name.as_str().to_string()),
    })
}
