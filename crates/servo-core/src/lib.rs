//! The tick engine: reads the latest commanded twist/jog, resolves it
//! against a kinematics model, clips it to joint limits and
//! singularity/collision scaling, and emits one outgoing command per
//! period.
//!
//! Most callers should reach for [`servo-client`](../servo_client/index.html)'s
//! `ServoService`, which owns the tick thread and the public
//! start/stop/pause surface; this crate is the algorithm underneath it.

mod builder;
mod error;
mod inputs;
mod kinematics;
mod singularity;
mod tick;

pub use builder::ServoCoreBuilder;
pub use error::ServoError;
pub use inputs::{InputsSnapshot, LatestInputs};
pub use kinematics::KinematicsProvider;
pub use singularity::{condition_number, resolve_direction_sign, singularity_scale};
pub use tick::{ServoCore, TickOutput};

#[cfg(any(test, feature = "test-util"))]
pub use kinematics::MockKinematics;
