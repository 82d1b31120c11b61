//! Admin TOTP - a time-based one-time password second factor for administrators
//!
//! Implements RFC 4226 (HOTP) and RFC 6238 (TOTP) bit-exactly so codes match
//! standard authenticator apps, plus the enrollment state machine that binds
//! the factor to an admin account.
//!
//! # Features
//!
//! - **Primitives**: Base32 codec, secret generation, HOTP/TOTP codes, drift-tolerant verification
//! - **Orchestration**: enroll / verify / disable with typed outcomes
//! - **Pluggable storage**: bring your own settings, admin directory, factor store and audit sink
//! - **Testing**: in-memory collaborators and a manual clock
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use admin_totp::clock::system_clock;
//! use admin_totp::factor::{FactorOrchestrator, TotpCode};
//! use admin_totp::testing::{InMemoryAdminDirectory, InMemoryFactorStore, StaticSettings};
//! use admin_totp::ConfigBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), admin_totp::TotpError> {
//!     admin_totp::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build()?;
//!
//!     let orchestrator = FactorOrchestrator::new(
//!         StaticSettings::enabled(),
//!         InMemoryAdminDirectory::new(),
//!         InMemoryFactorStore::new(),
//!         &config.totp,
//!         system_clock(),
//!     );
//!
//!     let outcome = orchestrator.verify("admin-1", &TotpCode::new("123456")?).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod clock;
mod config;
mod error;
pub mod factor;
pub mod testing;
pub mod totp;
pub mod utils;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, LoggingConfig, MAX_WINDOWS, MIN_SECRET_BYTES, TotpConfig};
pub use error::{Result, TotpError};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::utils::get_env_with_prefix;

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "auth.totp=debug")
/// - `ADMIN_TOTP_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
