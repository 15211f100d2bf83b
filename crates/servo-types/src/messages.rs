//! Incoming command shapes (twist / joint jog), robot feedback (joint
//! state), and the two outgoing command shapes the controller can emit.

/// A timestamp in seconds. `0.0` means "unset": a command carrying a
/// zero stamp is present but stamp-less, and is never considered stale
/// by age alone.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Stamp(pub f64);

impl Stamp {
    pub const UNSET: Stamp = Stamp(0.0);

    pub fn is_set(&self) -> bool {
        self.0 != 0.0
    }

    pub fn age(&self, now: f64) -> Option<f64> {
        if self.is_set() { Some(now - self.0) } else { None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    pub names: Vec<String>,
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    pub stamp: Stamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwistCmd {
    pub frame_id: String,
    pub stamp: Stamp,
    pub linear: [f64; 3],
    pub angular: [f64; 3],
}

impl TwistCmd {
    pub fn as_vector6(&self) -> [f64; 6] {
        [
            self.linear[0],
            self.linear[1],
            self.linear[2],
            self.angular[0],
            self.angular[1],
            self.angular[2],
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointJogCmd {
    pub names: Vec<String>,
    pub velocities: Vec<f64>,
    pub stamp: Stamp,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrajectoryPoint {
    pub time_from_start: f64,
    pub positions: Option<Vec<f64>>,
    pub velocities: Option<Vec<f64>>,
    pub accelerations: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingCommand {
    Trajectory {
        joint_names: Vec<String>,
        points: Vec<TrajectoryPoint>,
    },
    MultiArray {
        values: Vec<f64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_stamp_has_no_age() {
        assert_eq!(Stamp::UNSET.age(100.0), None);
    }

    #[test]
    fn set_stamp_reports_age() {
        let stamp = Stamp(10.0);
        assert_eq!(stamp.age(12.5), Some(2.5));
    }

    #[test]
    fn twist_vector6_preserves_component_order() {
        let twist = TwistCmd {
            frame_id: "tool0".to_string(),
            stamp: Stamp(1.0),
            linear: [1.0, 2.0, 3.0],
            angular: [4.0, 5.0, 6.0],
        };
        assert_eq!(twist.as_vector6(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
