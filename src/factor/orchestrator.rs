//! Enroll / verify / disable state machine for the admin TOTP factor.
//!
//! Business outcomes come back as `Ok(outcome)`; `Err` is reserved for
//! collaborator faults (storage, settings).

use std::collections::BTreeMap;

use super::audit::{
    AuditStore, AuthAuditEntry, AuthAuditEvent, OptionalAuditStore, WithAuditStore,
};
use super::storage::{AdminDirectory, FEATURE_FLAG_KEY, FactorStore, SettingsReader};
use super::types::{
    DisableFailure, DisableOutcome, EnrollFailure, EnrollOutcome, Enrollment, FactorStatusView,
    TotpCode, VerifyFailure, VerifyOutcome,
};
use crate::clock::SharedClock;
use crate::config::TotpConfig;
use crate::error::Result;
use crate::totp::{SecretGenerator, VerificationResult, Verifier};

/// Request context copied into audit entries (IP, user agent, ...).
pub type AuditContext = BTreeMap<String, String>;

/// Coordinates the TOTP factor for administrators.
///
/// The audit sink defaults to `()`, which drops entries. Use
/// [`with_audit_store`](Self::with_audit_store) to persist them.
pub struct FactorOrchestrator<S, D, F, A = ()>
where
    S: SettingsReader,
    D: AdminDirectory,
    F: FactorStore,
    A: OptionalAuditStore,
{
    settings: S,
    admins: D,
    factors: F,
    audit: A,
    secrets: SecretGenerator,
    verifier: Verifier,
    clock: SharedClock,
}

impl<S, D, F> FactorOrchestrator<S, D, F, ()>
where
    S: SettingsReader,
    D: AdminDirectory,
    F: FactorStore,
{
    /// Create an orchestrator without audit persistence.
    pub fn new(settings: S, admins: D, factors: F, config: &TotpConfig, clock: SharedClock) -> Self {
        Self {
            settings,
            admins,
            factors,
            audit: (),
            secrets: SecretGenerator::new().with_length(config.secret_bytes),
            verifier: Verifier::with_clock(clock.clone(), config.window_policy()),
            clock,
        }
    }

    /// Record audit entries in `store`. Store failures are logged and ignored.
    pub fn with_audit_store<A: AuditStore + Clone + 'static>(
        self,
        store: A,
    ) -> FactorOrchestrator<S, D, F, WithAuditStore<A>> {
        self.with_audit_sink(WithAuditStore(store))
    }
}

impl<S, D, F, A> FactorOrchestrator<S, D, F, A>
where
    S: SettingsReader,
    D: AdminDirectory,
    F: FactorStore,
    A: OptionalAuditStore,
{
    /// Replace the audit sink.
    pub fn with_audit_sink<B: OptionalAuditStore>(self, audit: B) -> FactorOrchestrator<S, D, F, B> {
        FactorOrchestrator {
            settings: self.settings,
            admins: self.admins,
            factors: self.factors,
            audit,
            secrets: self.secrets,
            verifier: self.verifier,
            clock: self.clock,
        }
    }

    #[must_use]
    pub fn with_secret_generator(mut self, secrets: SecretGenerator) -> Self {
        self.secrets = secrets;
        self
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Whether the `auth.totp.enabled` flag is on. Unset counts as off.
    pub async fn is_feature_enabled(&self) -> Result<bool> {
        Ok(self.settings.get_bool(FEATURE_FLAG_KEY).await?.unwrap_or(false))
    }

    /// Provision a new secret and enable the factor.
    ///
    /// The secret is returned once, inside [`EnrollOutcome::Enrolled`].
    pub async fn enroll(&self, admin_id: &str) -> Result<EnrollOutcome> {
        self.enroll_with_context(admin_id, &AuditContext::new()).await
    }

    pub async fn enroll_with_context(
        &self,
        admin_id: &str,
        context: &AuditContext,
    ) -> Result<EnrollOutcome> {
        if !self.is_feature_enabled().await? {
            return Ok(reject_enroll(admin_id, EnrollFailure::FeatureDisabled));
        }

        let admin = match self.admins.get_by_id(admin_id).await? {
            Some(admin) => admin,
            None => return Ok(reject_enroll(admin_id, EnrollFailure::AdminNotFound)),
        };
        if !admin.is_active() {
            return Ok(reject_enroll(admin_id, EnrollFailure::AdminNotActive));
        }

        if matches!(self.factors.get(admin_id).await?, Some(record) if record.is_enabled) {
            return Ok(reject_enroll(admin_id, EnrollFailure::AlreadyEnabled));
        }

        let secret = self.secrets.generate();
        let now = self.clock.now();

        // Activated immediately; no proof-of-possession round trip.
        self.factors.save_enrollment(admin_id, &secret, now).await?;
        self.factors.activate(admin_id, now).await?;

        self.audit
            .log_auth(entry(AuthAuditEvent::TotpEnrolled, admin_id, now, context))
            .await;

        tracing::info!(target: "auth.totp.enrolled", admin_id = %admin_id, "TOTP factor enrolled");

        Ok(EnrollOutcome::Enrolled(Enrollment {
            secret,
            enrolled_at: now,
        }))
    }

    /// Check a submitted code for an enrolled admin.
    pub async fn verify(&self, admin_id: &str, code: &TotpCode) -> Result<VerifyOutcome> {
        self.verify_with_context(admin_id, code, &AuditContext::new())
            .await
    }

    pub async fn verify_with_context(
        &self,
        admin_id: &str,
        code: &TotpCode,
        context: &AuditContext,
    ) -> Result<VerifyOutcome> {
        if !self.is_feature_enabled().await? {
            return Ok(reject_verify(admin_id, VerifyFailure::FeatureDisabled));
        }

        let admin = match self.admins.get_by_id(admin_id).await? {
            Some(admin) => admin,
            None => return Ok(reject_verify(admin_id, VerifyFailure::AdminNotFound)),
        };
        if !admin.is_active() {
            return Ok(reject_verify(admin_id, VerifyFailure::NotEnabled));
        }

        let record = match self.factors.get(admin_id).await? {
            Some(record) if record.is_enabled => record,
            _ => return Ok(reject_verify(admin_id, VerifyFailure::NotEnabled)),
        };

        let result = self.verifier.verify(&record.secret, code.as_str())?;
        let now = self.clock.now();

        if !result.is_valid() {
            let reason = match result {
                VerificationResult::Expired => VerifyFailure::CodeExpired,
                _ => VerifyFailure::InvalidCode,
            };

            self.audit
                .log_auth(
                    entry(AuthAuditEvent::TotpFailed, admin_id, now, context)
                        .with_metadata("reason", reason.as_str()),
                )
                .await;

            tracing::warn!(
                target: "auth.totp.failed",
                admin_id = %admin_id,
                reason = %reason,
                "TOTP verification failed"
            );

            return Ok(reason.into());
        }

        // Codes stay reusable until their window closes.
        self.factors.touch(admin_id, now).await?;

        self.audit
            .log_auth(entry(AuthAuditEvent::TotpVerified, admin_id, now, context))
            .await;

        tracing::info!(target: "auth.totp.verified", admin_id = %admin_id, "TOTP code verified");

        Ok(VerifyOutcome::Verified)
    }

    /// Turn the factor off. A later [`enroll`](Self::enroll) provisions a fresh secret.
    pub async fn disable(&self, admin_id: &str) -> Result<DisableOutcome> {
        self.disable_with_context(admin_id, &AuditContext::new())
            .await
    }

    pub async fn disable_with_context(
        &self,
        admin_id: &str,
        context: &AuditContext,
    ) -> Result<DisableOutcome> {
        if !self.is_feature_enabled().await? {
            return Ok(reject_disable(admin_id, DisableFailure::FeatureDisabled));
        }

        match self.admins.get_by_id(admin_id).await? {
            Some(admin) if admin.is_active() => {}
            _ => return Ok(reject_disable(admin_id, DisableFailure::NotEnabled)),
        }

        match self.factors.get(admin_id).await? {
            Some(record) if record.is_enabled => {}
            _ => return Ok(reject_disable(admin_id, DisableFailure::NotEnabled)),
        }

        let now = self.clock.now();
        self.factors.disable(admin_id, now).await?;

        self.audit
            .log_auth(entry(AuthAuditEvent::TotpDisabled, admin_id, now, context))
            .await;

        tracing::info!(target: "auth.totp.disabled", admin_id = %admin_id, "TOTP factor disabled");

        Ok(DisableOutcome::Disabled)
    }

    /// Current enrollment state, without the secret.
    ///
    /// Returns `None` when the feature is off or the admin never enrolled.
    pub async fn status(&self, admin_id: &str) -> Result<Option<FactorStatusView>> {
        if !self.is_feature_enabled().await? {
            return Ok(None);
        }
        Ok(self
            .factors
            .get(admin_id)
            .await?
            .map(|record| record.status_view()))
    }
}

fn entry(
    event: AuthAuditEvent,
    admin_id: &str,
    occurred_at: chrono::DateTime<chrono::Utc>,
    context: &AuditContext,
) -> AuthAuditEntry {
    let mut entry = AuthAuditEntry::new(event, admin_id, occurred_at);
    entry.context = context.clone();
    entry
}

fn reject_enroll(admin_id: &str, reason: EnrollFailure) -> EnrollOutcome {
    tracing::debug!(target: "auth.totp.rejected", admin_id = %admin_id, op = "enroll", reason = %reason);
    reason.into()
}

fn reject_verify(admin_id: &str, reason: VerifyFailure) -> VerifyOutcome {
    tracing::debug!(target: "auth.totp.rejected", admin_id = %admin_id, op = "verify", reason = %reason);
    reason.into()
}

fn reject_disable(admin_id: &str, reason: DisableFailure) -> DisableOutcome {
    tracing::debug!(target: "auth.totp.rejected", admin_id = %admin_id, op = "disable", reason = %reason);
    reason.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::{AdminStatus, AdminView, FactorRecord};
    use crate::testing::{
        InMemoryAdminDirectory, InMemoryFactorStore, ManualClock, RecordingAuditStore,
        StaticSettings, StoreCall,
    };
    use crate::totp::CodeGenerator;
    use std::sync::Arc;

    const NOW: i64 = 1_600_000_000;

    struct Harness {
        settings: StaticSettings,
        admins: InMemoryAdminDirectory,
        factors: InMemoryFactorStore,
        audit: RecordingAuditStore,
        clock: Arc<ManualClock>,
    }

    impl Harness {
        fn new() -> Self {
            let admins = InMemoryAdminDirectory::new();
            admins.insert(AdminView::new("admin-1", AdminStatus::Active));
            Self {
                settings: StaticSettings::enabled(),
                admins,
                factors: InMemoryFactorStore::new(),
                audit: RecordingAuditStore::new(),
                clock: Arc::new(ManualClock::at_timestamp(NOW)),
            }
        }

        fn orchestrator(
            &self,
        ) -> FactorOrchestrator<
            StaticSettings,
            InMemoryAdminDirectory,
            InMemoryFactorStore,
            WithAuditStore<RecordingAuditStore>,
        > {
            FactorOrchestrator::new(
                self.settings.clone(),
                self.admins.clone(),
                self.factors.clone(),
                &TotpConfig::default(),
                self.clock.clone(),
            )
            .with_audit_store(self.audit.clone())
        }

        fn current_code(&self, secret: &str) -> TotpCode {
            let code = CodeGenerator::new(self.clock.clone())
                .generate(secret, None)
                .unwrap();
            TotpCode::new(code).unwrap()
        }
    }

    #[tokio::test]
    async fn test_enroll_activates_immediately() {
        let h = Harness::new();
        let outcome = h.orchestrator().enroll("admin-1").await.unwrap();

        let secret = outcome.secret().unwrap().to_string();
        assert_eq!(secret.len(), 32);

        let record = h.factors.record("admin-1").unwrap();
        assert!(record.is_enabled);
        assert_eq!(record.secret, secret);
        assert_eq!(record.enrolled_at, Some(h.clock.current()));
        assert_eq!(
            h.factors.calls(),
            vec![
                StoreCall::SaveEnrollment("admin-1".into()),
                StoreCall::Activate("admin-1".into()),
            ]
        );
        assert_eq!(h.audit.events(), vec![AuthAuditEvent::TotpEnrolled]);
    }

    #[tokio::test]
    async fn test_enroll_precondition_order() {
        let h = Harness::new();
        h.settings.set(FEATURE_FLAG_KEY, false);
        let outcome = h.orchestrator().enroll("missing").await.unwrap();
        assert_eq!(outcome.failure(), Some(EnrollFailure::FeatureDisabled));
        assert_eq!(h.admins.lookups(), 0);

        h.settings.set(FEATURE_FLAG_KEY, true);
        let outcome = h.orchestrator().enroll("missing").await.unwrap();
        assert_eq!(outcome.failure(), Some(EnrollFailure::AdminNotFound));

        h.admins.insert(AdminView::new("admin-2", AdminStatus::Suspended));
        let outcome = h.orchestrator().enroll("admin-2").await.unwrap();
        assert_eq!(outcome.failure(), Some(EnrollFailure::AdminNotActive));
        assert!(h.factors.calls().is_empty());
        assert!(h.audit.entries().is_empty());
    }

    #[tokio::test]
    async fn test_verify_accepts_current_code() {
        let h = Harness::new();
        let orchestrator = h.orchestrator();
        let secret = orchestrator
            .enroll("admin-1")
            .await
            .unwrap()
            .secret()
            .unwrap()
            .to_string();

        let outcome = orchestrator
            .verify("admin-1", &h.current_code(&secret))
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::Verified);
        assert_eq!(
            h.factors.record("admin-1").unwrap().last_used_at,
            Some(h.clock.current())
        );
        assert_eq!(h.audit.count(AuthAuditEvent::TotpVerified), 1);
    }

    #[tokio::test]
    async fn test_verify_failure_records_reason() {
        let h = Harness::new();
        h.factors.insert(FactorRecord {
            admin_id: "admin-1".to_string(),
            secret: "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string(),
            is_enabled: true,
            enrolled_at: None,
            last_used_at: None,
            disabled_at: None,
        });

        // Two steps back falls one step outside the default window
        let stale = CodeGenerator::new(h.clock.clone())
            .generate_for_counter("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ", NOW / 30 - 2)
            .unwrap();
        let outcome = h
            .orchestrator()
            .verify("admin-1", &TotpCode::new(stale).unwrap())
            .await
            .unwrap();

        assert_eq!(outcome.failure(), Some(VerifyFailure::CodeExpired));
        let entries = h.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, AuthAuditEvent::TotpFailed);
        assert_eq!(
            entries[0].metadata.get("reason").map(String::as_str),
            Some("code_expired")
        );
        assert!(h.factors.calls().is_empty());
    }

    #[tokio::test]
    async fn test_verify_inactive_admin_is_not_enabled() {
        let h = Harness::new();
        h.admins.insert(AdminView::new("admin-2", AdminStatus::Disabled));
        let code = TotpCode::new("123456").unwrap();

        let outcome = h.orchestrator().verify("admin-2", &code).await.unwrap();
        assert_eq!(outcome.failure(), Some(VerifyFailure::NotEnabled));

        let outcome = h.orchestrator().verify("admin-1", &code).await.unwrap();
        assert_eq!(outcome.failure(), Some(VerifyFailure::NotEnabled));
        assert!(h.audit.entries().is_empty());
    }

    #[tokio::test]
    async fn test_verify_unknown_admin() {
        let h = Harness::new();
        let code = TotpCode::new("123456").unwrap();

        let outcome = h.orchestrator().verify("nobody", &code).await.unwrap();

        assert_eq!(outcome.failure(), Some(VerifyFailure::AdminNotFound));
        assert_eq!(h.admins.lookups(), 1);
        assert!(h.factors.calls().is_empty());
        assert!(h.audit.entries().is_empty());
    }

    #[tokio::test]
    async fn test_disable_suspended_admin_keeps_record() {
        let h = Harness::new();
        h.admins.insert(AdminView::new("admin-2", AdminStatus::Suspended));
        h.factors.insert(FactorRecord {
            admin_id: "admin-2".to_string(),
            secret: "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string(),
            is_enabled: true,
            enrolled_at: None,
            last_used_at: None,
            disabled_at: None,
        });

        let outcome = h.orchestrator().disable("admin-2").await.unwrap();

        assert_eq!(outcome.failure(), Some(DisableFailure::NotEnabled));
        assert!(h.factors.calls().is_empty());
        assert!(h.factors.record("admin-2").unwrap().is_enabled);
        assert!(h.audit.entries().is_empty());
    }

    #[tokio::test]
    async fn test_disable_then_reenroll() {
        let h = Harness::new();
        let orchestrator = h.orchestrator();
        let first = orchestrator.enroll("admin-1").await.unwrap();

        h.clock.advance(chrono::Duration::seconds(60));
        assert_eq!(
            orchestrator.disable("admin-1").await.unwrap(),
            DisableOutcome::Disabled
        );
        let record = h.factors.record("admin-1").unwrap();
        assert!(!record.is_enabled);
        assert_eq!(record.disabled_at, Some(h.clock.current()));

        assert_eq!(
            orchestrator.disable("admin-1").await.unwrap().failure(),
            Some(DisableFailure::NotEnabled)
        );

        let second = orchestrator.enroll("admin-1").await.unwrap();
        assert!(second.is_success());
        assert_ne!(first.secret(), second.secret());
        assert!(h.factors.record("admin-1").unwrap().is_enabled);
    }

    #[tokio::test]
    async fn test_context_is_copied_into_audit_entries() {
        let h = Harness::new();
        let mut context = AuditContext::new();
        context.insert("ip".to_string(), "10.0.0.1".to_string());

        h.orchestrator()
            .enroll_with_context("admin-1", &context)
            .await
            .unwrap();

        let entries = h.audit.entries();
        assert_eq!(entries[0].context, context);
        assert_eq!(entries[0].occurred_at, h.clock.current());
    }

    #[tokio::test]
    async fn test_status_hidden_when_feature_off() {
        let h = Harness::new();
        let orchestrator = h.orchestrator();
        orchestrator.enroll("admin-1").await.unwrap();

        let view = orchestrator.status("admin-1").await.unwrap().unwrap();
        assert!(view.is_enabled);
        assert!(orchestrator.status("admin-2").await.unwrap().is_none());

        h.settings.set(FEATURE_FLAG_KEY, false);
        assert!(orchestrator.status("admin-1").await.unwrap().is_none());
    }
}
