//! Value types shared by the servo controller: configuration, incoming
//! commands, outgoing commands, status codes, and dimension masks.
//!
//! This crate has no threading or kinematics concerns of its own — it is
//! plain data plus the validation rules that apply to it, so it can be
//! depended on by both the tick engine and anything that only needs to
//! decode or construct the command/status shapes.

pub mod config;
pub mod mask;
pub mod messages;
pub mod status;
pub mod validate;

pub use config::{CommandInType, CommandOutType, ConfigBuilder, ConfigError, ConfigLoadError, Configuration};
pub use mask::DimensionMask;
pub use messages::{JointJogCmd, JointState, OutgoingCommand, Stamp, TrajectoryPoint, TwistCmd};
pub use status::{AtomicStatusCode, StatusCode};
pub use validate::{ValidationError, is_nonzero_jog, is_nonzero_twist, validate_jog, validate_twist};
