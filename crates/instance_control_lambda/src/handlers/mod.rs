pub mod dispatch;
pub mod resize;
pub mod wait;
