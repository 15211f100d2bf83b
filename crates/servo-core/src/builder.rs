//! Chained construction of a [`ServoCore`](crate::tick::ServoCore),
//! validating configuration once at `build()`.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use servo_types::{AtomicStatusCode, Configuration};

use crate::error::ServoError;
use crate::inputs::LatestInputs;
use crate::kinematics::KinematicsProvider;
use crate::tick::ServoCore;

pub struct ServoCoreBuilder<K: KinematicsProvider> {
    config: Configuration,
    kinematics: K,
    inputs: Option<Arc<LatestInputs>>,
    status: Option<Arc<AtomicStatusCode>>,
    stop_requested: Option<Arc<AtomicBool>>,
}

impl<K: KinematicsProvider> ServoCoreBuilder<K> {
    pub fn new(kinematics: K) -> Self {
        Self {
            config: Configuration::default(),
            kinematics,
            inputs: None,
            status: None,
            stop_requested: None,
        }
    }

    pub fn config(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    /// Shares an existing `LatestInputs` slot instead of allocating a
    /// fresh one, so a caller can keep a handle to write commands into
    /// it before the core is built.
    pub fn inputs(mut self, inputs: Arc<LatestInputs>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn status_cell(mut self, status: Arc<AtomicStatusCode>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stop_flag(mut self, stop_requested: Arc<AtomicBool>) -> Self {
        self.stop_requested = Some(stop_requested);
        self
    }

    pub fn build(self) -> Result<ServoCore<K>, ServoError> {
        ServoCore::new(
            self.config,
            self.kinematics,
            self.inputs.unwrap_or_default(),
            self.status.unwrap_or_default(),
            self.stop_requested.unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::MockKinematics;

    #[test]
    fn build_succeeds_with_defaults() {
        let builder = ServoCoreBuilder::new(MockKinematics::identity(6));
        assert!(builder.build().is_ok());
    }

    #[test]
    fn build_propagates_invalid_configuration() {
        let config = Configuration {
            publish_joint_positions: false,
            publish_joint_velocities: false,
            publish_joint_accelerations: false,
            ..Configuration::default()
        };
        let builder = ServoCoreBuilder::new(MockKinematics::identity(6)).config(config);
        assert!(matches!(builder.build(), Err(ServoError::Config(_))));
    }

    #[test]
    fn build_fails_when_joint_group_is_empty() {
        let builder = ServoCoreBuilder::new(MockKinematics::identity(0));
        assert!(matches!(builder.build(), Err(ServoError::JointGroupUnavailable(_))));
    }
}
