//! Shared secret provisioning.

use rand::RngCore;

use super::base32;

/// Default secret length in bytes (160 bits, the RFC 4226 recommendation).
pub const DEFAULT_SECRET_BYTES: usize = 20;

/// Generates random Base32-encoded shared secrets.
#[derive(Clone, Debug)]
pub struct SecretGenerator {
    /// Number of random bytes per secret (default: 20).
    pub length: usize,
}

impl Default for SecretGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_SECRET_BYTES,
        }
    }
}

impl SecretGenerator {
    /// Create a generator producing 20-byte secrets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of random bytes. Zero falls back to the default.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = normalize_length(length);
        self
    }

    /// Generate a new secret of the configured length.
    pub fn generate(&self) -> String {
        self.generate_with_len(self.length)
    }

    /// Generate a new secret of `length` bytes. Zero falls back to the default.
    pub fn generate_with_len(&self, length: usize) -> String {
        let mut bytes = vec![0u8; normalize_length(length)];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        base32::encode(&bytes)
    }
}

fn normalize_length(length: usize) -> usize {
    if length == 0 {
        DEFAULT_SECRET_BYTES
    } else {
        length
    }
}
