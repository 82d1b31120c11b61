//! In-memory collaborators for testing.
//!
//! Every type here is cheap to clone and shares its state between clones, so
//! a test can hand one copy to the orchestrator and inspect another.
//!
//! # Example
//!
//! ```rust
//! use admin_totp::factor::{AdminStatus, AdminView, FactorOrchestrator};
//! use admin_totp::testing::{InMemoryAdminDirectory, InMemoryFactorStore, ManualClock, StaticSettings};
//! use admin_totp::TotpConfig;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), admin_totp::TotpError> {
//! let admins = InMemoryAdminDirectory::new();
//! admins.insert(AdminView::new("admin-1", AdminStatus::Active));
//! let factors = InMemoryFactorStore::new();
//!
//! let orchestrator = FactorOrchestrator::new(
//!     StaticSettings::enabled(),
//!     admins,
//!     factors.clone(),
//!     &TotpConfig::default(),
//!     Arc::new(ManualClock::at_timestamp(1_600_000_000)),
//! );
//!
//! let outcome = orchestrator.enroll("admin-1").await?;
//! assert!(outcome.is_success());
//! assert!(factors.record("admin-1").unwrap().is_enabled);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::clock::Clock;
use crate::error::{Result, TotpError};
use crate::factor::{
    AdminDirectory, AdminView, AuditStore, AuthAuditEntry, AuthAuditEvent, FEATURE_FLAG_KEY,
    FactorRecord, FactorStore, SettingsReader,
};

fn poisoned<T>(_: PoisonError<T>) -> TotpError {
    TotpError::storage("lock poisoned")
}

// =============================================================================
// Clock
// =============================================================================

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Clock fixed at a unix timestamp. Out-of-range values fall back to the epoch.
    pub fn at_timestamp(timestamp: i64) -> Self {
        Self::new(DateTime::from_timestamp(timestamp, 0).unwrap_or_default())
    }

    pub fn current(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.current()
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Fixed feature flags. Counts reads.
#[derive(Clone, Default)]
pub struct StaticSettings {
    values: Arc<RwLock<HashMap<String, bool>>>,
    reads: Arc<AtomicUsize>,
}

impl StaticSettings {
    /// No flags set (TOTP therefore disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// TOTP feature flag set to true.
    pub fn enabled() -> Self {
        let settings = Self::new();
        settings.set(FEATURE_FLAG_KEY, true);
        settings
    }

    /// TOTP feature flag explicitly set to false.
    pub fn disabled() -> Self {
        let settings = Self::new();
        settings.set(FEATURE_FLAG_KEY, false);
        settings
    }

    pub fn set(&self, key: &str, value: bool) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsReader for StaticSettings {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.values.read().map_err(poisoned)?.get(key).copied())
    }
}

// =============================================================================
// Admin directory
// =============================================================================

/// In-memory admin lookup. Counts lookups.
#[derive(Clone, Default)]
pub struct InMemoryAdminDirectory {
    admins: Arc<RwLock<HashMap<String, AdminView>>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryAdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, admin: AdminView) {
        self.admins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(admin.id.clone(), admin);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdminDirectory for InMemoryAdminDirectory {
    async fn get_by_id(&self, admin_id: &str) -> Result<Option<AdminView>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.admins.read().map_err(poisoned)?.get(admin_id).cloned())
    }
}

// =============================================================================
// Factor store
// =============================================================================

/// A mutating call made against [`InMemoryFactorStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    SaveEnrollment(String),
    Activate(String),
    Disable(String),
    Touch(String),
}

/// In-memory factor records. Logs every mutating call.
#[derive(Clone, Default)]
pub struct InMemoryFactorStore {
    records: Arc<RwLock<HashMap<String, FactorRecord>>>,
    calls: Arc<RwLock<Vec<StoreCall>>>,
}

impl InMemoryFactorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly (not logged as a call).
    pub fn insert(&self, record: FactorRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.admin_id.clone(), record);
    }

    pub fn record(&self, admin_id: &str) -> Option<FactorRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(admin_id)
            .cloned()
    }

    /// Mutating calls in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn log(&self, call: StoreCall) -> Result<()> {
        self.calls.write().map_err(poisoned)?.push(call);
        Ok(())
    }

    fn update(&self, admin_id: &str, apply: impl FnOnce(&mut FactorRecord)) -> Result<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        let record = records
            .get_mut(admin_id)
            .ok_or_else(|| TotpError::storage(format!("no TOTP record for {}", admin_id)))?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl FactorStore for InMemoryFactorStore {
    async fn get(&self, admin_id: &str) -> Result<Option<FactorRecord>> {
        Ok(self.records.read().map_err(poisoned)?.get(admin_id).cloned())
    }

    async fn save_enrollment(
        &self,
        admin_id: &str,
        secret: &str,
        enrolled_at: DateTime<Utc>,
    ) -> Result<()> {
        self.log(StoreCall::SaveEnrollment(admin_id.to_string()))?;
        let mut records = self.records.write().map_err(poisoned)?;
        let record = records
            .entry(admin_id.to_string())
            .or_insert_with(|| FactorRecord {
                admin_id: admin_id.to_string(),
                secret: String::new(),
                is_enabled: false,
                enrolled_at: None,
                last_used_at: None,
                disabled_at: None,
            });
        record.secret = secret.to_string();
        record.is_enabled = false;
        record.enrolled_at = Some(enrolled_at);
        Ok(())
    }

    async fn activate(&self, admin_id: &str, _verified_at: DateTime<Utc>) -> Result<()> {
        self.log(StoreCall::Activate(admin_id.to_string()))?;
        self.update(admin_id, |record| {
            record.is_enabled = true;
            record.disabled_at = None;
        })
    }

    async fn disable(&self, admin_id: &str, disabled_at: DateTime<Utc>) -> Result<()> {
        self.log(StoreCall::Disable(admin_id.to_string()))?;
        self.update(admin_id, |record| {
            record.is_enabled = false;
            record.disabled_at = Some(disabled_at);
        })
    }

    async fn touch(&self, admin_id: &str, used_at: DateTime<Utc>) -> Result<()> {
        self.log(StoreCall::Touch(admin_id.to_string()))?;
        self.update(admin_id, |record| record.last_used_at = Some(used_at))
    }
}

// =============================================================================
// Audit
// =============================================================================

/// Keeps every recorded audit entry.
#[derive(Clone, Default)]
pub struct RecordingAuditStore {
    entries: Arc<RwLock<Vec<AuthAuditEntry>>>,
}

impl RecordingAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuthAuditEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events(&self) -> Vec<AuthAuditEvent> {
        self.entries().into_iter().map(|e| e.event).collect()
    }

    pub fn count(&self, event: AuthAuditEvent) -> usize {
        self.entries().iter().filter(|e| e.event == event).count()
    }
}

#[async_trait]
impl AuditStore for RecordingAuditStore {
    async fn record_auth(&self, entry: &AuthAuditEntry) -> Result<()> {
        self.entries.write().map_err(poisoned)?.push(entry.clone());
        Ok(())
    }
}

/// An audit store that always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn record_auth(&self, _entry: &AuthAuditEntry) -> Result<()> {
        Err(TotpError::storage("audit backend unavailable"))
    }
}
