//! Tick engine error type.

use servo_types::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServoError {
    /// Invalid configuration supplied at construction.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The kinematics adapter's active-joint group does not contain any
    /// of the names the caller expects, or could not be resolved.
    #[error("joint group unavailable: {0}")]
    JointGroupUnavailable(String),

    /// A `LatestInputs` mutex was poisoned by a panicking thread.
    #[error("poisoned lock (thread panicked while holding shared state)")]
    PoisonedLock,

    /// `start` was called before any joint state had ever been received.
    #[error("not initialized: no joint state has been received yet")]
    NotInitialized,
}
