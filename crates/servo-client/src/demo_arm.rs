//! A small analytic arm model used by this crate's tests and by the
//! demo CLI — not a substitute for a real URDF-backed adapter.
//!
//! Models an N-joint planar chain of unit-length links rotating about
//! parallel axes, which is enough to exercise the Jacobian, condition
//! number, and joint-limit paths without pulling in a URDF parser.

use nalgebra::{DMatrix, Matrix4, Vector3};
use servo_core::KinematicsProvider;
use servo_tools::VariableBounds;

pub struct PlanarChainArm {
    names: Vec<String>,
    positions: Vec<f64>,
    link_length: f64,
    bounds: VariableBounds,
}

impl PlanarChainArm {
    pub fn new(num_joints: usize, link_length: f64) -> Self {
        Self {
            names: (0..num_joints).map(|i| format!("joint_{i}")).collect(),
            positions: vec![0.0; num_joints],
            link_length,
            bounds: VariableBounds {
                position_bounded: true,
                min_position: -std::f64::consts::PI,
                max_position: std::f64::consts::PI,
                velocity_bounded: true,
                min_velocity: -2.0,
                max_velocity: 2.0,
                acceleration_bounded: true,
                min_acceleration: -5.0,
                max_acceleration: 5.0,
            },
        }
    }

    fn joint_world_positions(&self) -> Vec<Vector3<f64>> {
        let mut points = Vec::with_capacity(self.names.len() + 1);
        let mut origin = Vector3::new(0.0, 0.0, 0.0);
        let mut heading = 0.0_f64;
        points.push(origin);
        for &theta in &self.positions {
            heading += theta;
            origin += Vector3::new(heading.cos(), heading.sin(), 0.0) * self.link_length;
            points.push(origin);
        }
        points
    }
}

impl KinematicsProvider for PlanarChainArm {
    fn set_positions(&mut self, positions: &[f64]) {
        self.positions.copy_from_slice(positions);
    }

    fn jacobian(&self) -> DMatrix<f64> {
        let n = self.names.len();
        let points = self.joint_world_positions();
        let tip = points[n];
        let mut jacobian = DMatrix::<f64>::zeros(6, n);
        let mut heading = 0.0_f64;
        for i in 0..n {
            heading += self.positions[i];
            let axis = Vector3::new(0.0, 0.0, 1.0);
            let arm = tip - points[i];
            let linear = axis.cross(&arm);
            jacobian[(0, i)] = linear.x;
            jacobian[(1, i)] = linear.y;
            jacobian[(2, i)] = linear.z;
            jacobian[(3, i)] = axis.x;
            jacobian[(4, i)] = axis.y;
            jacobian[(5, i)] = axis.z;
        }
        jacobian
    }

    fn global_transform(&self, frame_name: &str) -> Option<Matrix4<f64>> {
        let points = self.joint_world_positions();
        let tip = *points.last()?;
        if frame_name.is_empty() || frame_name == "tool0" || frame_name == "world" {
            let mut transform = Matrix4::identity();
            transform[(0, 3)] = tip.x;
            transform[(1, 3)] = tip.y;
            transform[(2, 3)] = tip.z;
            Some(transform)
        } else {
            None
        }
    }

    fn variable_bounds(&self, joint: &str) -> Option<VariableBounds> {
        self.names.iter().any(|n| n == joint).then_some(self.bounds)
    }

    fn satisfies_position_bounds(&self, joint: &str, margin: f64) -> bool {
        let Some(idx) = self.names.iter().position(|n| n == joint) else { return true };
        let pos = self.positions[idx];
        pos >= self.bounds.min_position + margin && pos <= self.bounds.max_position - margin
    }

    fn active_joint_names(&self) -> &[String] {
        &self.names
    }
}
