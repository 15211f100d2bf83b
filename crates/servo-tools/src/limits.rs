//! Per-joint acceleration/velocity clipping and the worst-case stop
//! time estimate derived from the same bounds.

/// Mirrors the kinematics adapter's `getVariableBounds(joint)` contract:
/// independent bounded-flags and min/max pairs for position, velocity,
/// and acceleration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VariableBounds {
    pub position_bounded: bool,
    pub min_position: f64,
    pub max_position: f64,
    pub velocity_bounded: bool,
    pub min_velocity: f64,
    pub max_velocity: f64,
    pub acceleration_bounded: bool,
    pub min_acceleration: f64,
    pub max_acceleration: f64,
}

#[derive(Debug, Clone, Default)]
pub struct JointLimitEnforcer {
    pub bounds: Vec<VariableBounds>,
}

impl JointLimitEnforcer {
    pub fn new(bounds: Vec<VariableBounds>) -> Self {
        Self { bounds }
    }

    /// Clips `delta_theta[i]` (a position increment over one
    /// `period`) against joint `i`'s acceleration bound first, then its
    /// velocity bound against the post-acceleration-clip value.
    /// `prev_velocity` is updated in place to the resulting velocity.
    pub fn clip(&self, delta_theta: &mut [f64], prev_velocity: &mut [f64], period: f64) {
        for i in 0..delta_theta.len() {
            let bounds = match self.bounds.get(i) {
                Some(b) => b,
                None => continue,
            };
            let dtheta = delta_theta[i];
            if dtheta == 0.0 {
                continue;
            }

            if bounds.acceleration_bounded {
                let v = dtheta / period;
                let a = (v - prev_velocity[i]) / period;
                let limit = if a < bounds.min_acceleration {
                    Some(bounds.min_acceleration)
                } else if a > bounds.max_acceleration {
                    Some(bounds.max_acceleration)
                } else {
                    None
                };
                if let Some(a_limit) = limit {
                    let scale = (a_limit * period + prev_velocity[i]) * period / dtheta;
                    if scale.abs() < 1.0 {
                        delta_theta[i] *= scale;
                    }
                }
            }

            let dtheta = delta_theta[i];
            if dtheta == 0.0 {
                prev_velocity[i] = 0.0;
                continue;
            }

            if bounds.velocity_bounded {
                let v = dtheta / period;
                let limit = if v < bounds.min_velocity {
                    Some(bounds.min_velocity)
                } else if v > bounds.max_velocity {
                    Some(bounds.max_velocity)
                } else {
                    None
                };
                if let Some(v_limit) = limit {
                    let scale = (v_limit * period) / dtheta;
                    if scale.abs() < 1.0 {
                        delta_theta[i] *= scale;
                        prev_velocity[i] = v * scale;
                        continue;
                    }
                }
            }

            prev_velocity[i] = delta_theta[i] / period;
        }
    }
}

/// `max over active joints of |v| / a_limit`, skipping joints lacking
/// an acceleration bound. Returns `None` when no joint contributes a
/// value (all unbounded or list empty), matching the "skip and warn"
/// instruction at the call site.
pub fn worst_case_stop_time(velocities: &[f64], bounds: &[VariableBounds]) -> Option<f64> {
    velocities
        .iter()
        .zip(bounds.iter())
        .filter_map(|(v, b)| {
            if !b.acceleration_bounded {
                return None;
            }
            let a_limit = b.max_acceleration.abs().max(b.min_acceleration.abs());
            if a_limit <= 0.0 {
                return None;
            }
            Some(v.abs() / a_limit)
        })
        .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t))))
}
