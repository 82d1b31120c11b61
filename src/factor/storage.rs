//! Collaborator traits consumed by the factor orchestrator.
//!
//! Implement these for your database and settings layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use admin_totp::factor::{FactorRecord, FactorStore};
//! use async_trait::async_trait;
//!
//! struct PgFactorStore {
//!     pool: PgPool,
//! }
//!
//! #[async_trait]
//! impl FactorStore for PgFactorStore {
//!     async fn get(&self, admin_id: &str) -> Result<Option<FactorRecord>> {
//!         self.pool.fetch_totp_record(admin_id).await.map_err(TotpError::storage)
//!     }
//!
//!     // ... implement other methods
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{AdminView, FactorRecord};
use crate::error::Result;

/// Settings key of the TOTP feature flag.
pub const FEATURE_FLAG_KEY: &str = "auth.totp.enabled";

/// Read access to system feature flags.
#[async_trait]
pub trait SettingsReader: Send + Sync {
    /// Read a boolean setting. `None` if the key is not set.
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;
}

/// Lookup of administrator identities.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Get an admin by ID (None if no such admin).
    async fn get_by_id(&self, admin_id: &str) -> Result<Option<AdminView>>;
}

/// Persistence for per-admin TOTP records.
///
/// Concurrent writes for the same admin are not serialized by the
/// orchestrator; implementations decide the consistency model (last writer
/// wins is sufficient).
#[async_trait]
pub trait FactorStore: Send + Sync {
    /// Get the record for an admin (None if never enrolled).
    async fn get(&self, admin_id: &str) -> Result<Option<FactorRecord>>;

    /// Store a new secret, replacing any previous one.
    async fn save_enrollment(
        &self,
        admin_id: &str,
        secret: &str,
        enrolled_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Mark the record enabled.
    async fn activate(&self, admin_id: &str, verified_at: DateTime<Utc>) -> Result<()>;

    /// Mark the record disabled.
    async fn disable(&self, admin_id: &str, disabled_at: DateTime<Utc>) -> Result<()>;

    /// Record a successful verification.
    async fn touch(&self, admin_id: &str, used_at: DateTime<Utc>) -> Result<()>;
}
