//! Authentication audit trail for TOTP operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

use crate::error::Result;

/// TOTP audit event types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuthAuditEvent {
    /// A secret was provisioned and the factor enabled.
    #[serde(rename = "auth.totp.enrolled")]
    TotpEnrolled,
    /// A code was accepted.
    #[serde(rename = "auth.totp.verified")]
    TotpVerified,
    /// A code was rejected.
    #[serde(rename = "auth.totp.failed")]
    TotpFailed,
    /// The factor was turned off.
    #[serde(rename = "auth.totp.disabled")]
    TotpDisabled,
}

impl AuthAuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotpEnrolled => "auth.totp.enrolled",
            Self::TotpVerified => "auth.totp.verified",
            Self::TotpFailed => "auth.totp.failed",
            Self::TotpDisabled => "auth.totp.disabled",
        }
    }
}

impl std::fmt::Display for AuthAuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit entry for a TOTP operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthAuditEntry {
    /// Unique identifier for this audit entry.
    pub id: String,
    /// The type of event.
    pub event: AuthAuditEvent,
    /// Admin the event relates to.
    pub admin_id: String,
    /// Request context (IP, user agent, ...) supplied by the caller.
    pub context: BTreeMap<String, String>,
    /// Event-specific details.
    pub metadata: BTreeMap<String, String>,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuthAuditEntry {
    #[must_use]
    pub fn new(event: AuthAuditEvent, admin_id: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            admin_id: admin_id.into(),
            context: BTreeMap::new(),
            metadata: BTreeMap::new(),
            occurred_at,
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Trait for audit storage.
///
/// Implement this trait to persist audit entries to your database.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Record an audit entry.
    async fn record_auth(&self, entry: &AuthAuditEntry) -> Result<()>;
}

/// Best-effort audit sink used by the orchestrator.
///
/// Recording never fails from the caller's point of view; implementations
/// contain their own errors.
pub trait OptionalAuditStore: Send + Sync + Clone + 'static {
    /// Record an audit entry (fire and forget).
    fn log_auth(&self, entry: AuthAuditEntry) -> impl Future<Output = ()> + Send;
}

/// No-op implementation for when audit logging is disabled.
impl OptionalAuditStore for () {
    async fn log_auth(&self, _entry: AuthAuditEntry) {}
}

/// Wrapper to enable audit logging with a real store.
#[derive(Clone)]
pub struct WithAuditStore<A: AuditStore + Clone>(pub A);

impl<A: AuditStore + Clone + 'static> OptionalAuditStore for WithAuditStore<A> {
    async fn log_auth(&self, entry: AuthAuditEntry) {
        if let Err(e) = self.0.record_auth(&entry).await {
            tracing::warn!(
                error = %e,
                event = %entry.event,
                admin_id = %entry.admin_id,
                "Failed to record audit entry"
            );
        }
    }
}
