//! The public service facade: wraps a [`servo_core::ServoCore`] behind
//! `start`/`stop`/`pause`/`unpause`, the dimension-mask services, and
//! lock-free observation of the latest published status/command/stop
//! time. Most callers should reach for [`ServoService`] rather than
//! `servo-core` directly.

pub mod demo_arm;
pub mod service;

pub use demo_arm::PlanarChainArm;
pub use service::ServoService;
