//! Incoming-command validation: NaN/Inf checks and unitless-range
//! checks on `TwistCmd`/`JointJogCmd`, plus zero-ness detection.

use thiserror::Error;

use crate::TwistCmd;
use crate::messages::JointJogCmd;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ValidationError {
    #[error("component {index} is not finite: {value}")]
    NonFinite { index: usize, value: f64 },

    #[error("component {index} out of unitless range [-1, 1]: {value}")]
    OutOfUnitlessRange { index: usize, value: f64 },
}

/// `unitless` selects the stricter |component| <= 1 rule used when the
/// controller is configured for unitless command input.
pub fn validate_twist(twist: &TwistCmd, unitless: bool) -> Result<(), ValidationError> {
    for (index, value) in twist.as_vector6().iter().enumerate() {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite { index, value: *value });
        }
        if unitless && value.abs() > 1.0 {
            return Err(ValidationError::OutOfUnitlessRange { index, value: *value });
        }
    }
    Ok(())
}

pub fn validate_jog(jog: &JointJogCmd) -> Result<(), ValidationError> {
    for (index, value) in jog.velocities.iter().enumerate() {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite { index, value: *value });
        }
    }
    Ok(())
}

pub fn is_nonzero_twist(twist: &TwistCmd) -> bool {
    twist.as_vector6().iter().any(|v| *v != 0.0)
}

pub fn is_nonzero_jog(jog: &JointJogCmd) -> bool {
    jog.velocities.iter().any(|v| *v != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Stamp;
    use proptest::prelude::*;

    fn twist(linear: [f64; 3], angular: [f64; 3]) -> TwistCmd {
        TwistCmd {
            frame_id: "tool0".to_string(),
            stamp: Stamp(1.0),
            linear,
            angular,
        }
    }

    #[test]
    fn rejects_non_finite_twist_component() {
        let cmd = twist([f64::NAN, 0.0, 0.0], [0.0, 0.0, 0.0]);
        assert!(matches!(
            validate_twist(&cmd, false),
            Err(ValidationError::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_twist_component_in_unitless_mode() {
        let cmd = twist([1.5, 0.0, 0.0], [0.0, 0.0, 0.0]);
        assert!(matches!(
            validate_twist(&cmd, true),
            Err(ValidationError::OutOfUnitlessRange { index: 0, .. })
        ));
        assert!(validate_twist(&cmd, false).is_ok());
    }

    #[test]
    fn accepts_boundary_unitless_value() {
        let cmd = twist([1.0, -1.0, 0.0], [0.0, 0.0, 0.0]);
        assert!(validate_twist(&cmd, true).is_ok());
    }

    #[test]
    fn rejects_non_finite_jog_velocity() {
        let jog = JointJogCmd {
            names: vec!["joint1".to_string()],
            velocities: vec![f64::INFINITY],
            stamp: Stamp(1.0),
        };
        assert!(matches!(
            validate_jog(&jog),
            Err(ValidationError::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn detects_zero_and_nonzero_twist() {
        let zero = twist([0.0; 3], [0.0; 3]);
        let nonzero = twist([0.0, 0.0, 0.1], [0.0; 3]);
        assert!(!is_nonzero_twist(&zero));
        assert!(is_nonzero_twist(&nonzero));
    }

    #[test]
    fn detects_zero_and_nonzero_jog() {
        let zero = JointJogCmd {
            names: vec!["joint1".to_string()],
            velocities: vec![0.0],
            stamp: Stamp(1.0),
        };
        let nonzero = JointJogCmd {
            velocities: vec![0.2],
            ..zero.clone()
        };
        assert!(!is_nonzero_jog(&zero));
        assert!(is_nonzero_jog(&nonzero));
    }

    proptest! {
        /// Every component within [-1, 1] passes unitless validation;
        /// the rule is purely elementwise, so this holds for any vector
        /// built from in-range components.
        #[test]
        fn in_range_components_always_pass_unitless_validation(
            lx in -1.0..=1.0f64, ly in -1.0..=1.0f64, lz in -1.0..=1.0f64,
            ax in -1.0..=1.0f64, ay in -1.0..=1.0f64, az in -1.0..=1.0f64,
        ) {
            let cmd = twist([lx, ly, lz], [ax, ay, az]);
            prop_assert!(validate_twist(&cmd, true).is_ok());
        }

        /// A component whose magnitude exceeds 1 is always rejected in
        /// unitless mode, regardless of which axis it's on.
        #[test]
        fn out_of_range_component_always_fails_unitless_validation(
            index in 0..6usize,
            magnitude in 1.0001..10.0f64,
        ) {
            let mut components = [0.0; 6];
            components[index] = magnitude;
            let cmd = twist(
                [components[0], components[1], components[2]],
                [components[3], components[4], components[5]],
            );
            prop_assert!(validate_twist(&cmd, true).is_err());
        }
    }
}
