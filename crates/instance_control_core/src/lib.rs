//! Shared instance-control domain primitives.
//!
//! This crate owns request/response contracts, the instance state model, and
//! the resize decision table. It excludes AWS SDK and Lambda runtime concerns;
//! those live in `instance_control_lambda`.

pub mod contract;
pub mod error;
pub mod instance;
pub mod poll;
pub mod resize;
