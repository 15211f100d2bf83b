//! The kinematics adapter boundary: everything the tick engine needs
//! from a robot model, and nothing else. A real adapter wraps a URDF
//! solver; tests and demos wrap an analytic arm or a hand-built
//! mock.

use nalgebra::{DMatrix, Matrix4};
use servo_tools::VariableBounds;

/// External contract the servo core drives every tick. Implementors
/// own the current joint positions and answer Jacobian/transform/bound
/// queries against them.
pub trait KinematicsProvider {
    /// Seeds the model's internal joint state, in `active_joint_names()` order.
    fn set_positions(&mut self, positions: &[f64]);

    /// The 6xN geometric Jacobian at the current joint positions.
    fn jacobian(&self) -> DMatrix<f64>;

    /// The 4x4 homogeneous transform of `frame_name` in the model's
    /// root frame.
    fn global_transform(&self, frame_name: &str) -> Option<Matrix4<f64>>;

    fn variable_bounds(&self, joint: &str) -> Option<VariableBounds>;

    /// `true` iff `joint`'s current position is within its position
    /// bounds shrunk inward by `margin` on each side. A negative
    /// margin widens the bounds instead (used to detect "beyond the
    /// inner safety margin" rather than "beyond the hard limit").
    fn satisfies_position_bounds(&self, joint: &str, margin: f64) -> bool;

    fn active_joint_names(&self) -> &[String];
}

#[cfg(any(test, feature = "test-util"))]
pub struct MockKinematics {
    pub names: Vec<String>,
    pub positions: Vec<f64>,
    pub jacobian: DMatrix<f64>,
    pub bounds: Vec<VariableBounds>,
    pub transforms: std::collections::HashMap<String, Matrix4<f64>>,
    pub position_bounds_satisfied: bool,
}

#[cfg(any(test, feature = "test-util"))]
impl MockKinematics {
    pub fn identity(num_joints: usize) -> Self {
        let mut jacobian = DMatrix::<f64>::zeros(6, num_joints);
        for i in 0..num_joints.min(6) {
            jacobian[(i, i)] = 1.0;
        }
        Self {
            names: (0..num_joints).map(|i| format!("joint{i}")).collect(),
            positions: vec![0.0; num_joints],
            jacobian,
            bounds: vec![VariableBounds::default(); num_joints],
            transforms: std::collections::HashMap::new(),
            position_bounds_satisfied: true,
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl KinematicsProvider for MockKinematics {
    fn set_positions(&mut self, positions: &[f64]) {
        self.positions.copy_from_slice(positions);
    }

    fn jacobian(&self) -> DMatrix<f64> {
        self.jacobian.clone()
    }

    fn global_transform(&self, frame_name: &str) -> Option<Matrix4<f64>> {
        self.transforms.get(frame_name).copied().or(Some(Matrix4::identity()))
    }

    fn variable_bounds(&self, joint: &str) -> Option<VariableBounds> {
        self.names.iter().position(|n| n == joint).map(|i| self.bounds[i])
    }

    fn satisfies_position_bounds(&self, _joint: &str, _margin: f64) -> bool {
        self.position_bounds_satisfied
    }

    fn active_joint_names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mock_has_diagonal_jacobian() {
        let mock = MockKinematics::identity(6);
        let j = mock.jacobian();
        assert_eq!(j.nrows(), 6);
        assert_eq!(j.ncols(), 6);
        for i in 0..6 {
            assert_eq!(j[(i, i)], 1.0);
        }
    }

    #[test]
    fn missing_frame_falls_back_to_identity() {
        let mock = MockKinematics::identity(3);
        let t = mock.global_transform("tool0").unwrap();
        assert_eq!(t, Matrix4::identity());
    }

    #[test]
    fn unknown_joint_has_no_bounds() {
        let mock = MockKinematics::identity(2);
        assert!(mock.variable_bounds("ghost").is_none());
    }
}
