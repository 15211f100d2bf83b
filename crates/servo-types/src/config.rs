//! Controller configuration: the immutable-after-init parameter set and
//! the validation rules applied to it at construction time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandInType {
    Unitless,
    SpeedUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutType {
    Trajectory,
    MultiArray,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub publish_period: f64,
    pub command_in_type: CommandInType,
    pub command_out_type: CommandOutType,
    pub publish_joint_positions: bool,
    pub publish_joint_velocities: bool,
    pub publish_joint_accelerations: bool,
    pub linear_scale: f64,
    pub rotational_scale: f64,
    pub joint_scale: f64,
    pub low_pass_filter_coeff: f64,
    pub incoming_command_timeout: f64,
    pub num_outgoing_halt_msgs_to_publish: u32,
    pub lower_singularity_threshold: f64,
    pub hard_stop_singularity_threshold: f64,
    pub joint_limit_margin: f64,
    pub planning_frame: String,
    pub robot_link_command_frame: String,
    pub move_group_name: String,
    pub gazebo_mode: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            publish_period: 0.01,
            command_in_type: CommandInType::Unitless,
            command_out_type: CommandOutType::Trajectory,
            publish_joint_positions: true,
            publish_joint_velocities: true,
            publish_joint_accelerations: false,
            linear_scale: 0.4,
            rotational_scale: 0.4,
            joint_scale: 0.4,
            low_pass_filter_coeff: 2.0,
            incoming_command_timeout: 0.1,
            num_outgoing_halt_msgs_to_publish: 4,
            lower_singularity_threshold: 17.0,
            hard_stop_singularity_threshold: 30.0,
            joint_limit_margin: 0.1,
            planning_frame: "planning_frame".to_string(),
            robot_link_command_frame: "tool0".to_string(),
            move_group_name: "manipulator".to_string(),
            gazebo_mode: false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("publish_period must be > 0, got {0}")]
    NonPositivePublishPeriod(f64),

    #[error("low_pass_filter_coeff must be >= 1, got {0}")]
    FilterCoeffBelowOne(f64),

    #[error("incoming_command_timeout must be >= 0, got {0}")]
    NegativeTimeout(f64),

    #[error("joint_limit_margin must be >= 0, got {0}")]
    NegativeJointLimitMargin(f64),

    #[error(
        "singularity thresholds must satisfy hard_stop >= lower >= 0, got lower={lower}, hard={hard}"
    )]
    InvalidSingularityThresholds { lower: f64, hard: f64 },

    #[error("at least one of publish_joint_positions/velocities/accelerations must be true")]
    NoOutputFieldsEnabled,

    #[error(
        "command_out_type=multiarray requires exactly one of publish_joint_positions/publish_joint_velocities, got positions={positions}, velocities={velocities}"
    )]
    MultiArrayRequiresExactlyOnePositionOrVelocity { positions: bool, velocities: bool },

    #[error("{field} must not be empty")]
    MissingIdentifier { field: &'static str },
}

impl Configuration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.publish_period > 0.0) {
            return Err(ConfigError::NonPositivePublishPeriod(self.publish_period));
        }
        if !(self.low_pass_filter_coeff >= 1.0) {
            return Err(ConfigError::FilterCoeffBelowOne(self.low_pass_filter_coeff));
        }
        if self.incoming_command_timeout < 0.0 {
            return Err(ConfigError::NegativeTimeout(self.incoming_command_timeout));
        }
        if self.joint_limit_margin < 0.0 {
            return Err(ConfigError::NegativeJointLimitMargin(self.joint_limit_margin));
        }
        if self.hard_stop_singularity_threshold < self.lower_singularity_threshold
            || self.lower_singularity_threshold < 0.0
        {
            return Err(ConfigError::InvalidSingularityThresholds {
                lower: self.lower_singularity_threshold,
                hard: self.hard_stop_singularity_threshold,
            });
        }
        if !(self.publish_joint_positions
            || self.publish_joint_velocities
            || self.publish_joint_accelerations)
        {
            return Err(ConfigError::NoOutputFieldsEnabled);
        }
        if self.command_out_type == CommandOutType::MultiArray
            && (self.publish_joint_positions == self.publish_joint_velocities)
        {
            return Err(ConfigError::MultiArrayRequiresExactlyOnePositionOrVelocity {
                positions: self.publish_joint_positions,
                velocities: self.publish_joint_velocities,
            });
        }
        if self.planning_frame.is_empty() {
            return Err(ConfigError::MissingIdentifier { field: "planning_frame" });
        }
        if self.robot_link_command_frame.is_empty() {
            return Err(ConfigError::MissingIdentifier {
                field: "robot_link_command_frame",
            });
        }
        if self.move_group_name.is_empty() {
            return Err(ConfigError::MissingIdentifier { field: "move_group_name" });
        }
        Ok(())
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigLoadError> {
        let config: Configuration = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Configuration,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
        }
    }

    pub fn publish_period(mut self, period: f64) -> Self {
        self.config.publish_period = period;
        self
    }

    pub fn command_in_type(mut self, kind: CommandInType) -> Self {
        self.config.command_in_type = kind;
        self
    }

    pub fn command_out_type(mut self, kind: CommandOutType) -> Self {
        self.config.command_out_type = kind;
        self
    }

    pub fn publish_fields(mut self, positions: bool, velocities: bool, accelerations: bool) -> Self {
        self.config.publish_joint_positions = positions;
        self.config.publish_joint_velocities = velocities;
        self.config.publish_joint_accelerations = accelerations;
        self
    }

    pub fn scales(mut self, linear: f64, rotational: f64, joint: f64) -> Self {
        self.config.linear_scale = linear;
        self.config.rotational_scale = rotational;
        self.config.joint_scale = joint;
        self
    }

    pub fn low_pass_filter_coeff(mut self, coeff: f64) -> Self {
        self.config.low_pass_filter_coeff = coeff;
        self
    }

    pub fn incoming_command_timeout(mut self, timeout: f64) -> Self {
        self.config.incoming_command_timeout = timeout;
        self
    }

    pub fn num_outgoing_halt_msgs_to_publish(mut self, count: u32) -> Self {
        self.config.num_outgoing_halt_msgs_to_publish = count;
        self
    }

    pub fn singularity_thresholds(mut self, lower: f64, hard: f64) -> Self {
        self.config.lower_singularity_threshold = lower;
        self.config.hard_stop_singularity_threshold = hard;
        self
    }

    pub fn joint_limit_margin(mut self, margin: f64) -> Self {
        self.config.joint_limit_margin = margin;
        self
    }

    pub fn frames(mut self, planning_frame: impl Into<String>, robot_link_command_frame: impl Into<String>) -> Self {
        self.config.planning_frame = planning_frame.into();
        self.config.robot_link_command_frame = robot_link_command_frame.into();
        self
    }

    pub fn move_group_name(mut self, name: impl Into<String>) -> Self {
        self.config.move_group_name = name.into();
        self
    }

    pub fn gazebo_mode(mut self, enabled: bool) -> Self {
        self.config.gazebo_mode = enabled;
        self
    }

    pub fn build(self) -> Result<Configuration, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
