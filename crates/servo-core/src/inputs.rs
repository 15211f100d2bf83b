//! The single mutex-guarded slot asynchronous handlers write into and
//! the tick thread snapshots from. Held strictly during the copy; never
//! across kinematics calls, SVD, or publishing.

use std::sync::Mutex;

use servo_types::{DimensionMask, JointJogCmd, JointState, Stamp, TwistCmd};

#[derive(Debug, Clone)]
struct LatestInputsInner {
    joint_state: Option<JointState>,
    twist: Option<TwistCmd>,
    jog: Option<JointJogCmd>,
    collision_velocity_scale: f64,
    control_dims: DimensionMask,
    drift_dims: DimensionMask,
    paused: bool,
}

impl Default for LatestInputsInner {
    /// `control_dims` starts all-enabled (every Cartesian axis honored)
    /// and `drift_dims` starts all-disabled (no axis dropped from the
    /// Jacobian) — the two masks are not symmetric, so this cannot be
    /// derived.
    fn default() -> Self {
        Self {
            joint_state: None,
            twist: None,
            jog: None,
            collision_velocity_scale: 0.0,
            control_dims: DimensionMask::all_enabled(),
            drift_dims: DimensionMask::all_disabled(),
            paused: false,
        }
    }
}

/// A point-in-time copy of everything the tick needs, taken under the
/// mutex and then used lock-free for the rest of the tick.
#[derive(Debug, Clone)]
pub struct InputsSnapshot {
    pub joint_state: Option<JointState>,
    pub twist: Option<TwistCmd>,
    pub twist_nonzero: bool,
    pub jog: Option<JointJogCmd>,
    pub jog_nonzero: bool,
    pub collision_velocity_scale: f64,
    pub control_dims: DimensionMask,
    pub drift_dims: DimensionMask,
    pub paused: bool,
}

impl InputsSnapshot {
    pub fn twist_stamp(&self) -> Stamp {
        self.twist.as_ref().map_or(Stamp::UNSET, |t| t.stamp)
    }

    pub fn jog_stamp(&self) -> Stamp {
        self.jog.as_ref().map_or(Stamp::UNSET, |j| j.stamp)
    }

    /// `now - stamp >= timeout`. An unset stamp is never stale.
    pub fn twist_stale(&self, now: f64, timeout: f64) -> bool {
        self.twist_stamp().age(now).is_some_and(|age| age >= timeout)
    }

    pub fn jog_stale(&self, now: f64, timeout: f64) -> bool {
        self.jog_stamp().age(now).is_some_and(|age| age >= timeout)
    }
}

#[derive(Debug)]
pub struct LatestInputs(Mutex<LatestInputsInner>);

impl Default for LatestInputs {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestInputs {
    pub fn new() -> Self {
        Self(Mutex::new(LatestInputsInner::default()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LatestInputsInner> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_joint_state(&self, state: JointState) {
        self.lock().joint_state = Some(state);
    }

    pub fn has_joint_state(&self) -> bool {
        self.lock().joint_state.is_some()
    }

    pub fn set_twist(&self, twist: TwistCmd) {
        self.lock().twist = Some(twist);
    }

    pub fn set_jog(&self, jog: JointJogCmd) {
        self.lock().jog = Some(jog);
    }

    pub fn set_collision_velocity_scale(&self, scale: f64) {
        self.lock().collision_velocity_scale = scale.clamp(0.0, 1.0);
    }

    pub fn set_control_dims(&self, mask: DimensionMask) {
        self.lock().control_dims = mask;
    }

    pub fn set_drift_dims(&self, mask: DimensionMask) {
        self.lock().drift_dims = mask;
    }

    pub fn set_paused(&self, paused: bool) {
        self.lock().paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn snapshot(
        &self,
        is_nonzero_twist: impl Fn(&TwistCmd) -> bool,
        is_nonzero_jog: impl Fn(&JointJogCmd) -> bool,
    ) -> InputsSnapshot {
        let inner = self.lock();
        InputsSnapshot {
            twist_nonzero: inner.twist.as_ref().is_some_and(&is_nonzero_twist),
            jog_nonzero: inner.jog.as_ref().is_some_and(&is_nonzero_jog),
            joint_state: inner.joint_state.clone(),
            twist: inner.twist.clone(),
            jog: inner.jog.clone(),
            collision_velocity_scale: inner.collision_velocity_scale,
            control_dims: inner.control_dims,
            drift_dims: inner.drift_dims,
            paused: inner.paused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servo_types::validate::{is_nonzero_jog, is_nonzero_twist};

    #[test]
    fn snapshot_reflects_latest_writes() {
        let inputs = LatestInputs::new();
        inputs.set_twist(TwistCmd {
            frame_id: "tool0".to_string(),
            stamp: Stamp(5.0),
            linear: [1.0, 0.0, 0.0],
            angular: [0.0; 3],
        });
        inputs.set_collision_velocity_scale(1.5); // clamps to 1.0

        let snap = inputs.snapshot(is_nonzero_twist, is_nonzero_jog);
        assert!(snap.twist_nonzero);
        assert!(!snap.jog_nonzero);
        assert_eq!(snap.collision_velocity_scale, 1.0);
    }

    #[test]
    fn unset_stamp_is_never_stale() {
        let inputs = LatestInputs::new();
        inputs.set_twist(TwistCmd {
            frame_id: "tool0".to_string(),
            stamp: Stamp::UNSET,
            linear: [1.0, 0.0, 0.0],
            angular: [0.0; 3],
        });
        let snap = inputs.snapshot(is_nonzero_twist, is_nonzero_jog);
        assert!(!snap.twist_stale(1_000_000.0, 0.1));
    }

    #[test]
    fn stale_command_detected_by_age() {
        let inputs = LatestInputs::new();
        inputs.set_twist(TwistCmd {
            frame_id: "tool0".to_string(),
            stamp: Stamp(1.0),
            linear: [1.0, 0.0, 0.0],
            angular: [0.0; 3],
        });
        let snap = inputs.snapshot(is_nonzero_twist, is_nonzero_jog);
        assert!(snap.twist_stale(2.0, 0.5));
        assert!(!snap.twist_stale(1.2, 0.5));
    }

    #[test]
    fn default_dimension_masks_control_all_drift_none() {
        let inputs = LatestInputs::new();
        let snap = inputs.snapshot(is_nonzero_twist, is_nonzero_jog);
        assert_eq!(snap.control_dims.as_array(), [true; 6]);
        assert_eq!(snap.drift_dims.as_array(), [false; 6]);
    }

    #[test]
    fn has_joint_state_reports_presence() {
        let inputs = LatestInputs::new();
        assert!(!inputs.has_joint_state());
        inputs.set_joint_state(JointState {
            names: vec!["joint1".to_string()],
            positions: vec![0.0],
            velocities: vec![0.0],
            stamp: Stamp(1.0),
        });
        assert!(inputs.has_joint_state());
    }
}
