//! Shared, dependency-light building blocks used by the tick engine:
//! the low-pass filter bank, joint/twist limit enforcement, and
//! rate-limited logging.
//!
//! **Dependency rule**: only depends on `servo-types`, never on
//! `servo-core` or `servo-client`, so it can be reused by anything
//! that needs filtering or limit math without pulling in the tick
//! engine itself.

pub mod filter;
pub mod limits;
pub mod ratelimit;

pub use filter::{LowPassFilter, LowPassFilterBank};
pub use limits::{JointLimitEnforcer, VariableBounds};
pub use ratelimit::RateLimitedLog;
