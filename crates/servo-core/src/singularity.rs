//! Singularity analysis: condition-number based velocity scaling along
//! the Jacobian's worst-conditioned direction.

use nalgebra::DVector;
use servo_types::StatusCode;

/// Condition number of a (possibly row-reduced) Jacobian from its SVD
/// singular values: `sigma_max / sigma_min`. Returns `f64::INFINITY`
/// when the smallest singular value is exactly zero.
pub fn condition_number(singular_values: &DVector<f64>) -> f64 {
    let sigma_max = singular_values.iter().cloned().fold(f64::MIN, f64::max);
    let sigma_min = singular_values.iter().cloned().fold(f64::MAX, f64::min);
    if sigma_min == 0.0 { f64::INFINITY } else { sigma_max / sigma_min }
}

/// Resolves the sign ambiguity of "direction toward singularity" (the
/// SVD's last right-singular-vector direction isn't oriented). Probes
/// by nudging `delta_theta_test = pinv * (u_last / 100)` from the
/// current joint positions, recomputing the condition number there via
/// `jacobian_at`, and keeping the sign that does NOT increase it.
///
/// `jacobian_at` must return the Jacobian at the given joint positions
/// with the same row-reduction (drift mask) already applied as the one
/// `pinv` was computed from, and its singular values in the same
/// convention as `condition_number` expects.
pub fn resolve_direction_sign(
    u_last: &DVector<f64>,
    pinv: &nalgebra::DMatrix<f64>,
    kappa: f64,
    current_positions: &[f64],
    mut jacobian_at: impl FnMut(&[f64]) -> nalgebra::DMatrix<f64>,
) -> f64 {
    let delta_x_test = u_last / 100.0;
    let delta_theta_test = pinv * &delta_x_test;

    let mut perturbed = current_positions.to_vec();
    for (p, d) in perturbed.iter_mut().zip(delta_theta_test.iter()) {
        *p += d;
    }

    let jacobian_perturbed = jacobian_at(&perturbed);
    let svd = jacobian_perturbed.svd(false, false);
    let kappa_prime = condition_number(&svd.singular_values);

    if kappa_prime > kappa { -1.0 } else { 1.0 }
}

/// Scale factor applied to `delta_theta`, and the status code the tick
/// should raise as a result (`None` when no singularity warning
/// applies). `direction` is `u_last` after sign resolution.
pub fn singularity_scale(
    delta_x: &DVector<f64>,
    direction: &DVector<f64>,
    kappa: f64,
    lower_threshold: f64,
    hard_threshold: f64,
) -> (f64, Option<StatusCode>) {
    let d = direction.dot(delta_x);
    if d <= 0.0 {
        // moving away from the singular direction
        return (1.0, None);
    }

    if kappa <= lower_threshold {
        (1.0, None)
    } else if kappa < hard_threshold {
        let scale = 1.0 - (kappa - lower_threshold) / (hard_threshold - lower_threshold);
        (scale, Some(StatusCode::DecelerateForSingularity))
    } else {
        (0.0, Some(StatusCode::HaltForSingularity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::dvector;
    use proptest::prelude::*;

    #[test]
    fn condition_number_of_orthonormal_matrix_is_one() {
        let singular_values = dvector![2.0, 2.0, 2.0];
        assert_relative_eq!(condition_number(&singular_values), 1.0);
    }

    #[test]
    fn condition_number_is_infinite_at_exact_singularity() {
        let singular_values = dvector![1.0, 0.5, 0.0];
        assert_eq!(condition_number(&singular_values), f64::INFINITY);
    }

    #[test]
    fn scale_is_one_when_moving_away_from_singularity() {
        let delta_x = dvector![1.0, 0.0, 0.0];
        let direction = dvector![-1.0, 0.0, 0.0];
        let (scale, status) = singularity_scale(&delta_x, &direction, 50.0, 17.0, 30.0);
        assert_eq!(scale, 1.0);
        assert_eq!(status, None);
    }

    #[test]
    fn scale_is_one_below_lower_threshold() {
        let delta_x = dvector![1.0, 0.0, 0.0];
        let direction = dvector![1.0, 0.0, 0.0];
        let (scale, status) = singularity_scale(&delta_x, &direction, 5.0, 17.0, 30.0);
        assert_eq!(scale, 1.0);
        assert_eq!(status, None);
    }

    #[test]
    fn scale_ramps_down_in_the_decelerate_band() {
        let delta_x = dvector![1.0, 0.0, 0.0];
        let direction = dvector![1.0, 0.0, 0.0];
        let (scale, status) = singularity_scale(&delta_x, &direction, 23.5, 17.0, 30.0);
        assert_relative_eq!(scale, 0.5, epsilon = 1e-9);
        assert_eq!(status, Some(StatusCode::DecelerateForSingularity));
    }

    #[test]
    fn scale_is_zero_at_or_beyond_hard_threshold() {
        let delta_x = dvector![1.0, 0.0, 0.0];
        let direction = dvector![1.0, 0.0, 0.0];
        let (scale, status) = singularity_scale(&delta_x, &direction, 30.0, 17.0, 30.0);
        assert_eq!(scale, 0.0);
        assert_eq!(status, Some(StatusCode::HaltForSingularity));
    }

    #[test]
    fn sign_flips_when_kappa_would_increase() {
        let u_last = dvector![1.0, 0.0];
        let pinv = nalgebra::DMatrix::<f64>::identity(2, 2);
        // jacobian_at reports a worse condition number for any perturbation,
        // so the sign should flip away from +1.
        let sign = resolve_direction_sign(&u_last, &pinv, 10.0, &[0.0, 0.0], |_| {
            nalgebra::DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.001])
        });
        assert_eq!(sign, -1.0);
    }

    proptest! {
        /// The scale returned for a direction moving toward the
        /// singularity is always within [0, 1], and is monotonically
        /// non-increasing as kappa rises through the decelerate band.
        #[test]
        fn scale_is_bounded_and_monotonic_in_kappa(
            lower in 1.0..50.0f64,
            span in 1.0..50.0f64,
            t in 0.0..1.0f64,
        ) {
            let hard = lower + span;
            let delta_x = dvector![1.0, 0.0, 0.0];
            let direction = dvector![1.0, 0.0, 0.0];

            let kappa_a = lower + t * span * 0.4;
            let kappa_b = lower + t * span * 0.4 + span * 0.1;

            let (scale_a, _) = singularity_scale(&delta_x, &direction, kappa_a, lower, hard);
            let (scale_b, _) = singularity_scale(&delta_x, &direction, kappa_b, lower, hard);

            prop_assert!((0.0..=1.0).contains(&scale_a));
            prop_assert!((0.0..=1.0).contains(&scale_b));
            prop_assert!(scale_b <= scale_a + 1e-9);
        }
    }
}
