use std::fmt;

use thiserror::Error;

/// Which half of the stop → modify → start sequence a wait belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stop,
    Start,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("did not stop in time"),
            Self::Start => f.write_str("did not start in time"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("no running or stopped instance found")]
    NoActiveInstance,
    #[error("Instance {instance_id} {transition} after {attempts} state checks")]
    StateTransitionTimeout {
        instance_id: String,
        transition: Transition,
        attempts: u32,
    },
    #[error("compute api request failed: {0}")]
    UpstreamApi(String),
    #[error("wait on instance {instance_id} was cancelled")]
    Cancelled { instance_id: String },
}

impl ControllerError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamApi(message.into())
    }

    /// Stable snake_case name used in structured log details.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NoActiveInstance => "no_active_instance",
            Self::StateTransitionTimeout { .. } => "state_transition_timeout",
            Self::UpstreamApi(_) => "upstream_api_error",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
