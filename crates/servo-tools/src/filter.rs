//! Single-pole low-pass filter applied to joint positions after
//! integration, before output.

/// `filter(x) = (1-a)*x + a*y; y <- filter(x)`, where
/// `a = (coef - 1) / (coef + 1)` for a user-supplied `coef >= 1`.
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter {
    a: f64,
    y: f64,
    initialized: bool,
}

impl LowPassFilter {
    pub fn new(coeff: f64) -> Self {
        Self {
            a: Self::coeff_to_a(coeff),
            y: 0.0,
            initialized: false,
        }
    }

    fn coeff_to_a(coeff: f64) -> f64 {
        (coeff - 1.0) / (coeff + 1.0)
    }

    /// Seeds the internal state so the first `filter` call doesn't pull
    /// the signal toward zero.
    pub fn reset(&mut self, x: f64) {
        self.y = x;
        self.initialized = true;
    }

    pub fn filter(&mut self, x: f64) -> f64 {
        if !self.initialized {
            self.reset(x);
        }
        self.y = (1.0 - self.a) * x + self.a * self.y;
        self.y
    }

    pub fn set_coeff(&mut self, coeff: f64) {
        self.a = Self::coeff_to_a(coeff);
    }
}

#[derive(Debug, Clone)]
pub struct LowPassFilterBank {
    filters: Vec<LowPassFilter>,
}

impl LowPassFilterBank {
    pub fn new(num_joints: usize, coeff: f64) -> Self {
        Self {
            filters: vec![LowPassFilter::new(coeff); num_joints],
        }
    }

    pub fn reset_all(&mut self, positions: &[f64]) {
        for (filter, &position) in self.filters.iter_mut().zip(positions.iter()) {
            filter.reset(position);
        }
    }

    pub fn filter_all(&mut self, positions: &mut [f64]) {
        for (filter, position) in self.filters.iter_mut().zip(positions.iter_mut()) {
            *position = filter.filter(*position);
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn reset_seeds_state_without_pulling_toward_zero() {
        let mut filter = LowPassFilter::new(2.0);
        filter.reset(10.0);
        assert_relative_eq!(filter.filter(10.0), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn converges_toward_a_held_step_input() {
        let mut filter = LowPassFilter::new(2.0);
        filter.reset(0.0);
        let mut last = 0.0;
        for _ in 0..200 {
            last = filter.filter(1.0);
        }
        assert_relative_eq!(last, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn first_call_without_reset_seeds_from_input() {
        let mut filter = LowPassFilter::new(4.0);
        assert_relative_eq!(filter.filter(5.0), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn bank_filters_each_joint_independently() {
        let mut bank = LowPassFilterBank::new(2, 2.0);
        bank.reset_all(&[0.0, 10.0]);
        let mut positions = [1.0, 9.0];
        bank.filter_all(&mut positions);
        assert!(positions[0] > 0.0 && positions[0] < 1.0);
        assert!(positions[1] < 10.0 && positions[1] > 9.0);
    }

    proptest! {
        /// `filter` output always lies between the previous state and the
        /// new input, for any coefficient >= 1.
        #[test]
        fn filter_output_stays_between_prev_state_and_input(
            coeff in 1.0..1000.0f64,
            y0 in -100.0..100.0f64,
            x in -100.0..100.0f64,
        ) {
            let mut filter = LowPassFilter::new(coeff);
            filter.reset(y0);
            let y1 = filter.filter(x);
            let (lo, hi) = if y0 <= x { (y0, x) } else { (x, y0) };
            prop_assert!(y1 >= lo - 1e-9 && y1 <= hi + 1e-9);
        }

        /// Feeding the same value forever is a fixed point: the filter
        /// neither overshoots nor drifts away from it.
        #[test]
        fn holding_a_value_is_a_fixed_point(coeff in 1.0..1000.0f64, x in -100.0..100.0f64) {
            let mut filter = LowPassFilter::new(coeff);
            filter.reset(x);
            for _ in 0..50 {
                prop_assert!((filter.filter(x) - x).abs() < 1e-9);
            }
        }
    }
}
