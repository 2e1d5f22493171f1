use async_trait::async_trait;
use instance_control_core::error::ControllerError;
use instance_control_core::instance::{InstanceSnapshot, StateChange};

/// The slice of the compute API the controller drives.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn describe_instance(&self, instance_id: &str)
        -> Result<InstanceSnapshot, ControllerError>;

    /// Instances currently `running` or `stopped`, in API order.
    async fn describe_active_instances(&self) -> Result<Vec<InstanceSnapshot>, ControllerError>;

    async fn start_instance(&self, instance_id: &str) -> Result<StateChange, ControllerError>;

    async fn stop_instance(&self, instance_id: &str) -> Result<StateChange, ControllerError>;

    async fn modify_instance_type(
        &self,
        instance_id: &str,
        instance_type: &str,
    ) -> Result<(), ControllerError>;
}
