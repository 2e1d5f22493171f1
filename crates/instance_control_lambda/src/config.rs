use std::time::Duration;

use instance_control_core::poll::{PollPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use thiserror::Error;

pub const POLL_INTERVAL_ENV: &str = "RESIZE_POLL_INTERVAL_SECS";
pub const POLL_MAX_ATTEMPTS_ENV: &str = "RESIZE_POLL_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got '{value}'")]
    NotAnInteger { name: &'static str, value: String },
    #[error("RESIZE_POLL_MAX_ATTEMPTS must be at least 1")]
    ZeroAttempts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerConfig {
    pub poll_policy: PollPolicy,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let interval = parse_u64(POLL_INTERVAL_ENV, lookup(POLL_INTERVAL_ENV))?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let max_attempts = parse_u64(POLL_MAX_ATTEMPTS_ENV, lookup(POLL_MAX_ATTEMPTS_ENV))?
            .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }

        Ok(Self {
            poll_policy: PollPolicy::new(interval, max_attempts),
        })
    }
}

fn parse_u64(name: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::NotAnInteger { name, value: raw })
}
