//! Time source abstraction.
//!
//! Code generation and verification never read the wall clock directly; they
//! ask an injected [`Clock`]. Production code uses [`SystemClock`], tests use
//! [`crate::testing::ManualClock`].

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Provides the current instant.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Shared handle to a clock.
pub type SharedClock = Arc<dyn Clock>;

/// Convenience for building a [`SharedClock`] from the system clock.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_tracks_utc_now() {
        let before = Utc::now();
        let now = SystemClock.now();
        let after = Utc::now();
        assert!(before <= now && now <= after);
    }

    #[test]
    fn test_shared_clock_delegates() {
        let clock = system_clock();
        let now = clock.now();
        assert!(now.timestamp() > 1_600_000_000);
    }
}
