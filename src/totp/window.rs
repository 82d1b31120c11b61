//! Clock-drift tolerance for verification.

use serde::{Deserialize, Serialize};

/// How many time steps before and after the current one are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowPolicy {
    past_windows: u32,
    future_windows: u32,
}

impl Default for WindowPolicy {
    /// One step either side (±30 seconds).
    fn default() -> Self {
        Self {
            past_windows: 1,
            future_windows: 1,
        }
    }
}

impl WindowPolicy {
    /// Create a policy. Negative values are clamped to zero.
    pub fn new(past_windows: i64, future_windows: i64) -> Self {
        Self {
            past_windows: clamp(past_windows),
            future_windows: clamp(future_windows),
        }
    }

    /// Accept only the current time step.
    pub fn strict() -> Self {
        Self::new(0, 0)
    }

    /// Steps in the past that are still accepted.
    pub fn past_windows(&self) -> u32 {
        self.past_windows
    }

    /// Steps in the future that are accepted.
    pub fn future_windows(&self) -> u32 {
        self.future_windows
    }

    /// Upper bound on HMAC computations for one verification.
    pub fn max_checks(&self) -> u64 {
        u64::from(self.past_windows) + u64::from(self.future_windows) + 2
    }
}

fn clamp(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
