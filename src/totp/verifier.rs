//! Window-tolerant TOTP verification.

use serde::Serialize;
use subtle::ConstantTimeEq;

use super::code::{CodeGenerator, counter_at};
use super::window::WindowPolicy;
use crate::clock::SharedClock;
use crate::error::Result;

/// Classification of a submitted code.
///
/// `Expired` means the code was correct exactly one step beyond the accepted
/// past window; anything older is `Invalid`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    Valid,
    Expired,
    Invalid,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// Checks submitted codes against a secret at the clock's current time.
#[derive(Clone)]
pub struct Verifier {
    generator: CodeGenerator,
    policy: WindowPolicy,
    clock: SharedClock,
}

impl Verifier {
    pub fn new(generator: CodeGenerator, policy: WindowPolicy, clock: SharedClock) -> Self {
        Self {
            generator,
            policy,
            clock,
        }
    }

    /// Build a verifier whose generator shares `clock`.
    pub fn with_clock(clock: SharedClock, policy: WindowPolicy) -> Self {
        Self::new(CodeGenerator::new(clock.clone()), policy, clock)
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Classify `code` for `secret` at the current time.
    ///
    /// Runs at most `past + future + 2` HMAC computations.
    pub fn verify(&self, secret: &str, code: &str) -> Result<VerificationResult> {
        let current = counter_at(self.clock.now());
        let past = i64::from(self.policy.past_windows());
        let future = i64::from(self.policy.future_windows());

        for offset in -past..=future {
            let counter = current + offset;
            if counter < 0 {
                continue;
            }
            if self.matches(secret, counter, code)? {
                return Ok(VerificationResult::Valid);
            }
        }

        let expired_counter = current - (past + 1);
        if expired_counter >= 0 && self.matches(secret, expired_counter, code)? {
            return Ok(VerificationResult::Expired);
        }

        Ok(VerificationResult::Invalid)
    }

    fn matches(&self, secret: &str, counter: i64, code: &str) -> Result<bool> {
        let expected = self.generator.generate_for_counter(secret, counter)?;
        Ok(expected.as_bytes().ct_eq(code.as_bytes()).into())
    }
}
