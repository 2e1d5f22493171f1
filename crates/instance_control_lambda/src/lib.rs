//! AWS-oriented adapters and handlers for single-instance control.
//!
//! This crate owns runtime integration details (Lambda handlers, the EC2
//! adapter, environment configuration, and log wiring). Decision logic and
//! payload contracts come from `instance_control_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_support;
