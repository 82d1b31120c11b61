//! HOTP code generation (RFC 4226) with a time-derived counter (RFC 6238).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::base32;
use crate::clock::SharedClock;
use crate::error::{Result, TotpError};

type HmacSha1 = Hmac<Sha1>;

/// Length of one time step in seconds.
pub const TIME_STEP_SECONDS: i64 = 30;

/// Number of decimal digits in a code.
pub const CODE_DIGITS: usize = 6;

const CODE_MODULUS: u32 = 1_000_000;

/// Time-step counter for an instant: `floor(unix_seconds / 30)`.
///
/// Instants before the epoch yield negative counters.
pub fn counter_at(time: DateTime<Utc>) -> i64 {
    time.timestamp().div_euclid(TIME_STEP_SECONDS)
}

/// Compute the raw HOTP value for a key and counter, reduced to six digits.
pub fn hotp(key: &[u8], counter: u64) -> u32 {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();
    truncate(digest.as_slice()) % CODE_MODULUS
}

/// Dynamic truncation of an HMAC-SHA1 digest to a 31-bit integer.
fn truncate(digest: &[u8]) -> u32 {
    let offset = (digest[19] & 0x0F) as usize;
    u32::from_be_bytes([
        // Strip the top bit to avoid signed/unsigned ambiguity
        digest[offset] & 0x7F,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ])
}

/// Generates six-digit TOTP codes.
#[derive(Clone)]
pub struct CodeGenerator {
    clock: SharedClock,
}

impl CodeGenerator {
    /// Create a generator that reads the current time from `clock`.
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Generate the code for `time`, or for the clock's current time when `None`.
    pub fn generate(&self, secret: &str, time: Option<DateTime<Utc>>) -> Result<String> {
        let time = time.unwrap_or_else(|| self.clock.now());
        self.generate_for_counter(secret, counter_at(time))
    }

    /// Generate the code for an explicit time-step counter.
    ///
    /// # Errors
    ///
    /// Returns [`TotpError::NegativeCounter`] if `counter` is below zero.
    pub fn generate_for_counter(&self, secret: &str, counter: i64) -> Result<String> {
        let counter = u64::try_from(counter).map_err(|_| TotpError::NegativeCounter(counter))?;
        let key = base32::decode(secret);
        Ok(format!("{:0width$}", hotp(&key, counter), width = CODE_DIGITS))
    }
}
