pub mod compute;
pub mod ec2;
pub mod observer;
