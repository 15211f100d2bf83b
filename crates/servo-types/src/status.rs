//! Status codes published once per tick, and an atomic cell for
//! publishing them to observers without a lock.

use std::sync::atomic::{AtomicI8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum StatusCode {
    #[default]
    NoWarning = 0,
    DecelerateForSingularity = 1,
    HaltForSingularity = 2,
    DecelerateForCollision = 3,
    HaltForCollision = 4,
    JointBound = 5,
}

impl StatusCode {
    pub fn from_i8(value: i8) -> Self {
        match value {
            1 => StatusCode::DecelerateForSingularity,
            2 => StatusCode::HaltForSingularity,
            3 => StatusCode::DecelerateForCollision,
            4 => StatusCode::HaltForCollision,
            5 => StatusCode::JointBound,
            _ => StatusCode::NoWarning,
        }
    }

    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn is_halting(self) -> bool {
        matches!(self, StatusCode::HaltForSingularity | StatusCode::HaltForCollision)
    }
}

/// Lock-free publication cell for the current tick's status code.
#[derive(Debug)]
pub struct AtomicStatusCode(AtomicI8);

impl AtomicStatusCode {
    pub fn new(code: StatusCode) -> Self {
        Self(AtomicI8::new(code.as_i8()))
    }

    pub fn get(&self, ordering: Ordering) -> StatusCode {
        StatusCode::from_i8(self.0.load(ordering))
    }

    pub fn set(&self, code: StatusCode, ordering: Ordering) {
        self.0.store(code.as_i8(), ordering);
    }
}

impl Default for AtomicStatusCode {
    fn default() -> Self {
        Self::new(StatusCode::NoWarning)
    }
}

impl Clone for AtomicStatusCode {
    fn clone(&self) -> Self {
        Self::new(self.get(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_i8() {
        for code in [
            StatusCode::NoWarning,
            StatusCode::DecelerateForSingularity,
            StatusCode::HaltForSingularity,
            StatusCode::DecelerateForCollision,
            StatusCode::HaltForCollision,
            StatusCode::JointBound,
        ] {
            assert_eq!(StatusCode::from_i8(code.as_i8()), code);
        }
    }

    #[test]
    fn unknown_byte_defaults_to_no_warning() {
        assert_eq!(StatusCode::from_i8(-1), StatusCode::NoWarning);
        assert_eq!(StatusCode::from_i8(99), StatusCode::NoWarning);
    }

    #[test]
    fn atomic_get_set_round_trip() {
        let cell = AtomicStatusCode::default();
        assert_eq!(cell.get(Ordering::Relaxed), StatusCode::NoWarning);
        cell.set(StatusCode::JointBound, Ordering::Relaxed);
        assert_eq!(cell.get(Ordering::Relaxed), StatusCode::JointBound);
    }

    #[test]
    fn clone_captures_current_value() {
        let cell = AtomicStatusCode::new(StatusCode::HaltForCollision);
        let cloned = cell.clone();
        assert_eq!(cloned.get(Ordering::Relaxed), StatusCode::HaltForCollision);
    }

    #[test]
    fn halting_codes_are_identified() {
        assert!(StatusCode::HaltForSingularity.is_halting());
        assert!(StatusCode::HaltForCollision.is_halting());
        assert!(!StatusCode::DecelerateForSingularity.is_halting());
        assert!(!StatusCode::NoWarning.is_halting());
    }
}
