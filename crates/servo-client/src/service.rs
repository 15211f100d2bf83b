//! Public service facade over [`servo_core::ServoCore`]: owns the tick
//! thread, exposes `start`/`stop`/`pause`/`unpause`, the dimension-mask
//! services, command/joint-state ingestion, and lock-free observation
//! of the latest published status, command, and worst-case stop time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use arc_swap::ArcSwap;
use servo_core::{KinematicsProvider, LatestInputs, ServoCoreBuilder, ServoError};
use servo_types::{
    AtomicStatusCode, Configuration, DimensionMask, JointJogCmd, JointState, OutgoingCommand,
    StatusCode, TwistCmd,
};
use tracing::{error, info};

/// Runs a `ServoCore` on a dedicated thread at `Configuration::publish_period`,
/// publishing each tick's output into lock-free cells the caller can poll
/// from any thread without contending with the tick loop.
pub struct ServoService {
    inputs: Arc<LatestInputs>,
    status_cell: Arc<AtomicStatusCode>,
    stop_requested: Arc<AtomicBool>,
    tick_thread: Option<JoinHandle<()>>,
    latest_command: Arc<ArcSwap<Option<OutgoingCommand>>>,
    latest_stop_time: Arc<ArcSwap<Option<f64>>>,
    period: Duration,
}

impl ServoService {
    /// Builds and starts the tick engine from `config` and `kinematics`,
    /// spawning the dedicated tick thread immediately. The service starts
    /// paused; call [`ServoService::start`] to begin producing commands.
    pub fn new<K>(config: Configuration, kinematics: K) -> Result<Self, ServoError>
    where
        K: KinematicsProvider + Send + 'static,
    {
        config.validate()?;
        if kinematics.active_joint_names().is_empty() {
            return Err(ServoError::JointGroupUnavailable(config.move_group_name.clone()));
        }

        let period = Duration::from_secs_f64(config.publish_period.max(0.0));
        let inputs = Arc::new(LatestInputs::new());
        inputs.set_paused(true);
        let status_cell = Arc::new(AtomicStatusCode::default());
        let stop_requested = Arc::new(AtomicBool::new(false));

        let mut service = Self {
            inputs,
            status_cell,
            stop_requested,
            tick_thread: None,
            latest_command: Arc::new(ArcSwap::from_pointee(None)),
            latest_stop_time: Arc::new(ArcSwap::from_pointee(None)),
            period,
        };
        service.spawn(config, kinematics);
        Ok(service)
    }

    fn spawn<K>(&mut self, config: Configuration, kinematics: K)
    where
        K: KinematicsProvider + Send + 'static,
    {
        let inputs = Arc::clone(&self.inputs);
        let status_cell = Arc::clone(&self.status_cell);
        let stop_requested = Arc::clone(&self.stop_requested);
        let latest_command = Arc::clone(&self.latest_command);
        let latest_stop_time = Arc::clone(&self.latest_stop_time);
        let period = self.period;

        let handle = std::thread::spawn(move || {
            let mut core = match ServoCoreBuilder::new(kinematics)
                .config(config)
                .inputs(inputs)
                .status_cell(status_cell)
                .stop_flag(stop_requested)
                .build()
            {
                Ok(core) => core,
                Err(e) => {
                    error!("servo core failed to initialize on the tick thread: {e}");
                    return;
                },
            };

            let start = std::time::Instant::now();
            let mut next_tick = start;

            loop {
                let now = start.elapsed().as_secs_f64();
                match core.tick(now) {
                    Some(output) => {
                        latest_command.store(Arc::new(output.command));
                        latest_stop_time.store(Arc::new(output.worst_case_stop_time));
                    },
                    None => break,
                }

                next_tick += period;
                let at = std::time::Instant::now();
                if next_tick > at {
                    spin_sleep::sleep(next_tick - at);
                } else {
                    // control loop overrun: catch up instead of accumulating lag.
                    next_tick = at;
                }
            }
            info!("servo tick thread exiting");
        });

        self.tick_thread = Some(handle);
    }

    /// Unpauses the service, provided joint state has been received at
    /// least once. Returns [`ServoError::NotInitialized`] otherwise, in
    /// which case the service stays paused.
    pub fn start(&self) -> Result<(), ServoError> {
        if !self.inputs.has_joint_state() {
            return Err(ServoError::NotInitialized);
        }
        self.inputs.set_paused(false);
        Ok(())
    }

    /// Requests the tick thread to stop after its current tick and joins it.
    pub fn stop(mut self) {
        self.stop_requested.store(true, Ordering::Relaxed);
        if let Some(handle) = self.tick_thread.take() {
            let _ = handle.join();
        }
    }

    pub fn pause(&self) {
        self.inputs.set_paused(true);
    }

    pub fn unpause(&self) {
        self.inputs.set_paused(false);
    }

    pub fn is_paused(&self) -> bool {
        self.inputs.is_paused()
    }

    pub fn send_joint_state(&self, state: JointState) {
        self.inputs.set_joint_state(state);
    }

    pub fn send_twist(&self, twist: TwistCmd) {
        self.inputs.set_twist(twist);
    }

    pub fn send_joint_jog(&self, jog: JointJogCmd) {
        self.inputs.set_jog(jog);
    }

    pub fn set_collision_velocity_scale(&self, scale: f64) {
        self.inputs.set_collision_velocity_scale(scale);
    }

    pub fn set_control_dimensions(&self, mask: DimensionMask) {
        self.inputs.set_control_dims(mask);
    }

    pub fn set_drift_dimensions(&self, mask: DimensionMask) {
        self.inputs.set_drift_dims(mask);
    }

    /// Status published by the most recently completed tick.
    pub fn latest_status(&self) -> StatusCode {
        self.status_cell.get(Ordering::Relaxed)
    }

    /// Command published by the most recently completed tick, if any.
    pub fn latest_command(&self) -> Option<OutgoingCommand> {
        (**self.latest_command.load()).clone()
    }

    /// Worst-case stop time computed by the most recently completed
    /// tick, if any joint reports an acceleration bound.
    pub fn latest_stop_time(&self) -> Option<f64> {
        **self.latest_stop_time.load()
    }
}

impl Drop for ServoService {
    fn drop(&mut self) {
        self.stop_requested.store(true, Ordering::Relaxed);
        if let Some(handle) = self.tick_thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servo_core::MockKinematics;

    #[test]
    fn new_rejects_invalid_configuration() {
        let config = Configuration {
            publish_joint_positions: false,
            publish_joint_velocities: false,
            publish_joint_accelerations: false,
            ..Configuration::default()
        };
        let result = ServoService::new(config, MockKinematics::identity(6));
        assert!(result.is_err());
    }

    #[test]
    fn start_unpauses_and_stop_joins_cleanly() {
        let service = ServoService::new(Configuration::default(), MockKinematics::identity(6)).unwrap();
        service.pause();
        assert!(service.is_paused());
        service.send_joint_state(JointState {
            names: (0..6).map(|i| format!("joint{i}")).collect(),
            positions: vec![0.0; 6],
            velocities: vec![0.0; 6],
            stamp: servo_types::Stamp(0.0),
        });
        service.start().unwrap();
        assert!(!service.is_paused());
        service.stop();
    }

    #[test]
    fn start_refuses_without_joint_state() {
        let service = ServoService::new(Configuration::default(), MockKinematics::identity(6)).unwrap();
        let err = service.start().unwrap_err();
        assert!(matches!(err, ServoError::NotInitialized));
        assert!(service.is_paused());
        service.stop();
    }

    #[test]
    fn observation_accessors_default_to_no_command() {
        let service = ServoService::new(Configuration::default(), MockKinematics::identity(6)).unwrap();
        assert_eq!(service.latest_status(), StatusCode::NoWarning);
        assert!(service.latest_command().is_none());
        service.stop();
    }
}
