//! Admin TOTP factor: the enroll / verify / disable lifecycle.
//!
//! [`FactorOrchestrator`] enforces the preconditions (feature flag, admin
//! status, enrollment state) and drives the collaborators you supply:
//!
//! - [`SettingsReader`] for the `auth.totp.enabled` flag
//! - [`AdminDirectory`] for admin lookup
//! - [`FactorStore`] for the per-admin record
//! - [`AuditStore`] (optional) for the audit trail
//!
//! Audit failures are logged and never change the result.

mod audit;
mod orchestrator;
mod storage;
mod types;

pub use audit::{AuditStore, AuthAuditEntry, AuthAuditEvent, OptionalAuditStore, WithAuditStore};
pub use orchestrator::{AuditContext, FactorOrchestrator};
pub use storage::{AdminDirectory, FEATURE_FLAG_KEY, FactorStore, SettingsReader};
pub use types::{
    AdminStatus, AdminView, DisableFailure, DisableOutcome, EnrollFailure, EnrollOutcome,
    Enrollment, FactorRecord, FactorStatusView, TotpCode, VerifyFailure, VerifyOutcome,
};
