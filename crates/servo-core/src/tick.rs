//! The periodic tick: ingests the latest commands, runs the Cartesian
//! or joint path, applies limits and filtering, and composes the
//! outgoing command.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use nalgebra::{DMatrix, DVector, Matrix4};

use servo_tools::{JointLimitEnforcer, LowPassFilterBank, RateLimitedLog, VariableBounds, limits};
use servo_types::{
    AtomicStatusCode, CommandInType, CommandOutType, Configuration, JointState, OutgoingCommand,
    Stamp, StatusCode, TrajectoryPoint,
};

use crate::error::ServoError;
use crate::inputs::{InputsSnapshot, LatestInputs};
use crate::kinematics::KinematicsProvider;
use crate::singularity;

/// What a tick produced, independent of how (or whether) the caller
/// publishes it.
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub status: StatusCode,
    pub worst_case_stop_time: Option<f64>,
    pub command: Option<OutgoingCommand>,
}

const GAZEBO_REDUNDANT_MESSAGE_COUNT: usize = 30;

pub struct ServoCore<K: KinematicsProvider> {
    config: Configuration,
    kinematics: K,
    inputs: Arc<LatestInputs>,
    status: Arc<AtomicStatusCode>,
    stop_requested: Arc<std::sync::atomic::AtomicBool>,
    log: RateLimitedLog,

    joint_names: Vec<String>,
    enforcer: JointLimitEnforcer,
    filters: LowPassFilterBank,

    prev_joint_velocity: Vec<f64>,
    original_joint_state: JointState,
    internal_joint_state: JointState,
    last_sent_command: Option<OutgoingCommand>,
    zero_velocity_count: u32,
    wait_for_first_command: bool,
    tf_planning_to_cmd_frame: Matrix4<f64>,
}

impl<K: KinematicsProvider> ServoCore<K> {
    pub fn new(
        config: Configuration,
        kinematics: K,
        inputs: Arc<LatestInputs>,
        status: Arc<AtomicStatusCode>,
        stop_requested: Arc<std::sync::atomic::AtomicBool>,
    ) -> Result<Self, ServoError> {
        config.validate()?;

        let joint_names = kinematics.active_joint_names().to_vec();
        if joint_names.is_empty() {
            return Err(ServoError::JointGroupUnavailable(config.move_group_name.clone()));
        }
        let n = joint_names.len();

        let bounds: Vec<VariableBounds> = joint_names
            .iter()
            .map(|name| kinematics.variable_bounds(name).unwrap_or_default())
            .collect();

        let empty_state = JointState {
            names: joint_names.clone(),
            positions: vec![0.0; n],
            velocities: vec![0.0; n],
            stamp: Stamp::UNSET,
        };

        Ok(Self {
            enforcer: JointLimitEnforcer::new(bounds),
            filters: LowPassFilterBank::new(n, config.low_pass_filter_coeff),
            prev_joint_velocity: vec![0.0; n],
            original_joint_state: empty_state.clone(),
            internal_joint_state: empty_state,
            last_sent_command: None,
            zero_velocity_count: 0,
            wait_for_first_command: true,
            tf_planning_to_cmd_frame: Matrix4::identity(),
            joint_names,
            config,
            kinematics,
            inputs,
            status,
            stop_requested,
            log: RateLimitedLog::default(),
        })
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    fn period(&self) -> f64 {
        self.config.publish_period
    }

    fn unitless(&self) -> bool {
        self.config.command_in_type == CommandInType::Unitless
    }

    /// Runs one tick at time `now` (seconds). Returns `None` once a
    /// stop has been requested.
    pub fn tick(&mut self, now: f64) -> Option<TickOutput> {
        if self.stop_requested.load(Ordering::Relaxed) {
            return None;
        }

        // 1. publish current status, then reset for this tick.
        let published_status = self.status.get(Ordering::Relaxed);
        self.status.set(StatusCode::NoWarning, Ordering::Relaxed);
        let mut status = StatusCode::NoWarning;

        // 2. refresh internal joint state from the latest snapshot.
        if !self.inputs.has_joint_state() {
            return Some(TickOutput {
                status: published_status,
                worst_case_stop_time: None,
                command: None,
            });
        }
        let snapshot = self.inputs.snapshot(servo_types::validate::is_nonzero_twist, servo_types::validate::is_nonzero_jog);
        if let Some(joint_state) = &snapshot.joint_state {
            self.refresh_internal_joint_state(joint_state);
        }
        self.original_joint_state = self.internal_joint_state.clone();

        // 3. worst-case stop time.
        let worst_case_stop_time =
            limits::worst_case_stop_time(&self.prev_joint_velocity, &self.enforcer.bounds);
        if worst_case_stop_time.is_none() {
            self.log.warn("stop_time_unbounded", "no joint reports an acceleration bound; worst-case stop time is unavailable");
        }

        // 5. planning -> command frame transform.
        self.tf_planning_to_cmd_frame = self.compute_planning_to_cmd_frame();

        // 6. pause / wait-for-first-command branch.
        if snapshot.paused || self.wait_for_first_command {
            self.filters.reset_all(&self.original_joint_state.positions);
            if snapshot.twist_stamp().is_set() || snapshot.jog_stamp().is_set() {
                self.wait_for_first_command = false;
            }
            return Some(TickOutput { status: published_status, worst_case_stop_time, command: None });
        }

        // 7. selection.
        let twist_ready = snapshot.twist_nonzero && !snapshot.twist_stale(now, self.config.incoming_command_timeout);
        let jog_ready = snapshot.jog_nonzero && !snapshot.jog_stale(now, self.config.incoming_command_timeout);

        let n = self.joint_names.len();
        let mut delta_theta = DVector::<f64>::zeros(n);
        let emit_nonzero;

        if twist_ready {
            if let Some(twist) = &snapshot.twist {
                match servo_types::validate::validate_twist(twist, self.unitless()) {
                    Ok(()) => {
                        delta_theta = self.cartesian_branch(twist, &snapshot, &mut status);
                        emit_nonzero = true;
                    },
                    Err(e) => {
                        self.log.warn("invalid_twist", format!("rejecting twist command: {e}"));
                        emit_nonzero = false;
                    },
                }
            } else {
                emit_nonzero = false;
            }
        } else if jog_ready {
            if let Some(jog) = &snapshot.jog {
                match servo_types::validate::validate_jog(jog) {
                    Ok(()) => {
                        delta_theta = self.joint_branch(jog);
                        emit_nonzero = true;
                    },
                    Err(e) => {
                        self.log.warn("invalid_jog", format!("rejecting joint jog command: {e}"));
                        emit_nonzero = false;
                    },
                }
            } else {
                emit_nonzero = false;
            }
        } else {
            emit_nonzero = false;
        }

        // 10. shared post-processing.
        self.internal_joint_state = self.original_joint_state.clone();
        let period = self.period();

        let mut delta_theta_vec: Vec<f64> = delta_theta.iter().cloned().collect();
        self.enforcer.clip(&mut delta_theta_vec, &mut self.prev_joint_velocity, period);

        let collision_scale = snapshot.collision_velocity_scale.clamp(0.0, 1.0);
        for value in delta_theta_vec.iter_mut() {
            *value *= collision_scale;
        }
        if collision_scale == 0.0 {
            status = StatusCode::HaltForCollision;
        } else if collision_scale < 1.0 {
            status = StatusCode::DecelerateForCollision;
        }

        let mut positions = self.original_joint_state.positions.clone();
        let mut velocities = vec![0.0; n];
        for i in 0..n {
            positions[i] += delta_theta_vec[i];
            velocities[i] = delta_theta_vec[i] / period;
        }
        self.filters.filter_all(&mut positions);
        self.prev_joint_velocity = velocities.clone();

        let mut command = self.compose_outgoing(&positions, &velocities);

        if self.violates_position_bounds(&positions, &velocities) {
            self.sudden_halt(&mut command);
            status = StatusCode::JointBound;
            self.prev_joint_velocity = vec![0.0; n];
        }

        // 11. emit decision.
        let publish_this_tick;
        if emit_nonzero {
            self.zero_velocity_count = 0;
            publish_this_tick = true;
        } else {
            self.zero_velocity_count = self.zero_velocity_count.saturating_add(1);
            publish_this_tick = self.config.num_outgoing_halt_msgs_to_publish == 0
                || self.zero_velocity_count <= self.config.num_outgoing_halt_msgs_to_publish;
            if publish_this_tick {
                let zero_velocities = vec![0.0; n];
                command = self.compose_outgoing(&self.original_joint_state.positions, &zero_velocities);
            }
        }

        self.status.set(status, Ordering::Relaxed);

        let command = if publish_this_tick { Some(command) } else { None };
        if let Some(cmd) = &command {
            self.last_sent_command = Some(cmd.clone());
        }

        Some(TickOutput { status: published_status, worst_case_stop_time, command })
    }

    fn refresh_internal_joint_state(&mut self, joint_state: &JointState) {
        for (i, name) in self.joint_names.iter().enumerate() {
            if let Some(src) = joint_state.names.iter().position(|n| n == name) {
                self.internal_joint_state.positions[i] = joint_state.positions[src];
                self.internal_joint_state.velocities[i] = joint_state.velocities[src];
            }
        }
        self.internal_joint_state.stamp = joint_state.stamp;
        self.kinematics.set_positions(&self.internal_joint_state.positions);
    }

    fn compute_planning_to_cmd_frame(&self) -> Matrix4<f64> {
        let planning = self.kinematics.global_transform(&self.config.planning_frame);
        let cmd = self.kinematics.global_transform(&self.config.robot_link_command_frame);
        match (planning, cmd) {
            (Some(planning), Some(cmd)) => {
                planning.try_inverse().map(|inv| inv * cmd).unwrap_or(Matrix4::identity())
            },
            _ => Matrix4::identity(),
        }
    }

    fn rotation_for_frame(&self, frame_id: &str) -> nalgebra::Matrix3<f64> {
        if frame_id.is_empty() || frame_id == self.config.robot_link_command_frame {
            return self.tf_planning_to_cmd_frame.fixed_view::<3, 3>(0, 0).clone_owned();
        }
        let planning = self.kinematics.global_transform(&self.config.planning_frame);
        let incoming = self.kinematics.global_transform(frame_id);
        match (planning, incoming) {
            (Some(planning), Some(incoming)) => {
                let transform = planning.try_inverse().map(|inv| inv * incoming).unwrap_or(Matrix4::identity());
                transform.fixed_view::<3, 3>(0, 0).clone_owned()
            },
            _ => nalgebra::Matrix3::identity(),
        }
    }

    fn cartesian_branch(
        &mut self,
        twist: &servo_types::TwistCmd,
        snapshot: &InputsSnapshot,
        status: &mut StatusCode,
    ) -> DVector<f64> {
        let n = self.joint_names.len();

        // 8a: control_dims mask.
        let mut twist6 = twist.as_vector6();
        snapshot.control_dims.apply(&mut twist6);

        // 8b: rotate linear/angular into the planning frame.
        let rotation = self.rotation_for_frame(&twist.frame_id);
        let linear = rotation * nalgebra::Vector3::new(twist6[0], twist6[1], twist6[2]);
        let angular = rotation * nalgebra::Vector3::new(twist6[3], twist6[4], twist6[5]);

        // 8c: scale into a position increment over one period.
        let period = self.period();
        let (lin_scale, rot_scale) = if self.unitless() {
            (self.config.linear_scale * period, self.config.rotational_scale * period)
        } else {
            (period, period)
        };
        let mut delta_x = DVector::<f64>::from_vec(vec![
            linear.x * lin_scale,
            linear.y * lin_scale,
            linear.z * lin_scale,
            angular.x * rot_scale,
            angular.y * rot_scale,
            angular.z * rot_scale,
        ]);

        // 8d: row-reduce by drift mask.
        let mut jacobian = self.kinematics.jacobian();
        let drift = snapshot.drift_dims.as_array();
        for d in (0..6).rev() {
            if drift[d] && jacobian.nrows() > 1 {
                jacobian = jacobian.remove_row(d);
                delta_x = delta_x.remove_row(d);
            }
        }

        // 8e: SVD + pseudoinverse.
        let svd = jacobian.clone().svd(true, true);
        let pinv = svd.clone().pseudo_inverse(1e-9).unwrap_or_else(|_| DMatrix::zeros(n, jacobian.nrows()));
        let delta_theta = &pinv * &delta_x;

        // 8f: singularity scale.
        let kappa = singularity::condition_number(&svd.singular_values);
        if let (Some(u), Some(_v_t)) = (&svd.u, &svd.v_t) {
            let min_idx = svd
                .singular_values
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap_or(0);
            let u_last = u.column(min_idx).clone_owned();
            let sign = self.probe_singularity_direction_sign(&u_last, &pinv, kappa, drift);
            let direction = u_last * sign;
            let (scale, raised) = singularity::singularity_scale(
                &delta_x,
                &direction,
                kappa,
                self.config.lower_singularity_threshold,
                self.config.hard_stop_singularity_threshold,
            );
            if let Some(code) = raised {
                *status = code;
            }
            return delta_theta * scale;
        }

        delta_theta
    }

    /// Resolves the sign ambiguity of `u_last` via
    /// [`singularity::resolve_direction_sign`], supplying a closure that
    /// probes the kinematics adapter at perturbed joint positions and
    /// restores the original positions before returning.
    fn probe_singularity_direction_sign(
        &mut self,
        u_last: &DVector<f64>,
        pinv: &DMatrix<f64>,
        kappa: f64,
        drift: [bool; 6],
    ) -> f64 {
        let original_positions = self.internal_joint_state.positions.clone();

        let sign = singularity::resolve_direction_sign(u_last, pinv, kappa, &original_positions, |positions| {
            self.kinematics.set_positions(positions);
            let mut jacobian_prime = self.kinematics.jacobian();
            for d in (0..6).rev() {
                if drift[d] && jacobian_prime.nrows() > 1 {
                    jacobian_prime = jacobian_prime.remove_row(d);
                }
            }
            jacobian_prime
        });

        self.kinematics.set_positions(&original_positions);
        sign
    }

    fn joint_branch(&self, jog: &servo_types::JointJogCmd) -> DVector<f64> {
        let n = self.joint_names.len();
        let period = self.period();
        let mut delta_theta = DVector::<f64>::zeros(n);
        for (name, &v) in jog.names.iter().zip(jog.velocities.iter()) {
            if let Some(idx) = self.joint_names.iter().position(|j| j == name) {
                delta_theta[idx] = if self.unitless() {
                    v * self.config.joint_scale * period
                } else {
                    v * period
                };
            } else {
                self.log.warn("unknown_jog_joint", format!("joint jog named an unknown joint: {name}"));
            }
        }
        delta_theta
    }

    fn violates_position_bounds(&self, positions: &[f64], velocities: &[f64]) -> bool {
        for (i, name) in self.joint_names.iter().enumerate() {
            if self.kinematics.satisfies_position_bounds(name, -self.config.joint_limit_margin) {
                continue;
            }
            let Some(bounds) = self.kinematics.variable_bounds(name) else { continue };
            if !bounds.position_bounded {
                continue;
            }
            let dist_to_min = positions[i] - bounds.min_position;
            let dist_to_max = bounds.max_position - positions[i];
            let near_min = dist_to_min <= dist_to_max;
            let moving_outward = if near_min { velocities[i] < 0.0 } else { velocities[i] > 0.0 };
            if moving_outward {
                return true;
            }
        }
        false
    }

    fn sudden_halt(&self, command: &mut OutgoingCommand) {
        let n = self.joint_names.len();
        match command {
            OutgoingCommand::Trajectory { points, .. } => {
                if points.is_empty() {
                    points.push(TrajectoryPoint {
                        time_from_start: self.period(),
                        positions: Some(self.original_joint_state.positions.clone()),
                        velocities: Some(vec![0.0; n]),
                        accelerations: None,
                    });
                } else {
                    for point in points.iter_mut() {
                        point.positions = Some(self.original_joint_state.positions.clone());
                        point.velocities = Some(vec![0.0; n]);
                    }
                }
            },
            OutgoingCommand::MultiArray { values } => {
                if self.config.publish_joint_positions {
                    *values = self.original_joint_state.positions.clone();
                } else {
                    *values = vec![0.0; n];
                }
            },
        }
    }

    fn compose_outgoing(&self, positions: &[f64], velocities: &[f64]) -> OutgoingCommand {
        let n = self.joint_names.len();
        let period = self.period();
        match self.config.command_out_type {
            CommandOutType::Trajectory => {
                let point = TrajectoryPoint {
                    time_from_start: period,
                    positions: self.config.publish_joint_positions.then(|| positions.to_vec()),
                    velocities: self.config.publish_joint_velocities.then(|| velocities.to_vec()),
                    accelerations: self.config.publish_joint_accelerations.then(|| vec![0.0; n]),
                };
                let points = if self.config.gazebo_mode {
                    (0..GAZEBO_REDUNDANT_MESSAGE_COUNT)
                        .map(|i| TrajectoryPoint {
                            time_from_start: (i + 1) as f64 * period,
                            ..point.clone()
                        })
                        .collect()
                } else {
                    vec![point]
                };
                OutgoingCommand::Trajectory { joint_names: self.joint_names.clone(), points }
            },
            CommandOutType::MultiArray => {
                let values =
                    if self.config.publish_joint_positions { positions.to_vec() } else { velocities.to_vec() };
                OutgoingCommand::MultiArray { values }
            },
        }
    }
}
