use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ControllerError;

/// Lifecycle states reported by the compute API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
}

impl InstanceState {
    /// States an instance can be resized from, used to filter the active-instance scan.
    pub const ACTIVE: [InstanceState; 2] = [InstanceState::Running, InstanceState::Stopped];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceState {
    type Err = ControllerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "stopping" => Ok(Self::Stopping),
            "stopped" => Ok(Self::Stopped),
            "shutting-down" => Ok(Self::ShuttingDown),
            "terminated" => Ok(Self::Terminated),
            other => Err(ControllerError::upstream(format!(
                "unrecognized instance state '{other}'"
            ))),
        }
    }
}

/// Point-in-time view of one instance, fetched fresh for every decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSnapshot {
    pub id: String,
    pub state: InstanceState,
    pub instance_type: String,
}

/// Acknowledgement returned by a start or stop call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub instance_id: String,
    pub previous_state: Option<String>,
    pub current_state: Option<String>,
}
