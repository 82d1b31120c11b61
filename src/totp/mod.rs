//! TOTP primitives.
//!
//! Everything here is a pure function of its inputs and the injected clock:
//! Base32 encoding of secrets, HOTP code generation, the drift window and the
//! verifier that combines them.
//!
//! # Example
//!
//! ```rust
//! use admin_totp::clock::system_clock;
//! use admin_totp::totp::{CodeGenerator, SecretGenerator, Verifier, WindowPolicy};
//!
//! let clock = system_clock();
//! let secret = SecretGenerator::new().generate();
//! let code = CodeGenerator::new(clock.clone()).generate(&secret, None)?;
//!
//! let verifier = Verifier::with_clock(clock, WindowPolicy::default());
//! assert!(verifier.verify(&secret, &code)?.is_valid());
//! # Ok::<(), admin_totp::TotpError>(())
//! ```

pub mod base32;
mod code;
mod secret;
mod uri;
mod verifier;
mod window;

pub use code::{CODE_DIGITS, CodeGenerator, TIME_STEP_SECONDS, counter_at, hotp};
pub use secret::{DEFAULT_SECRET_BYTES, SecretGenerator};
pub use uri::provisioning_uri;
pub use verifier::{VerificationResult, Verifier};
pub use window::WindowPolicy;
