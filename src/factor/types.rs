//! Types exchanged with the factor orchestrator and its collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TotpError};
use crate::totp::provisioning_uri;

/// A code submitted by an admin. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct TotpCode(String);

impl TotpCode {
    /// Wrap a submitted code.
    ///
    /// # Errors
    ///
    /// Returns [`TotpError::EmptyCode`] for an empty string.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.is_empty() {
            return Err(TotpError::EmptyCode);
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TotpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TotpCode(<redacted>)")
    }
}

impl AsRef<str> for TotpCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TotpCode {
    type Err = TotpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for TotpCode {
    type Error = TotpError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for TotpCode {
    type Error = TotpError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

/// Account status of an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    Active,
    Suspended,
    Disabled,
}

/// What the orchestrator needs to know about an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminView {
    pub id: String,
    pub status: AdminStatus,
    /// Used as the account label when provisioning authenticator apps.
    pub email: Option<String>,
}

impl AdminView {
    pub fn new(id: impl Into<String>, status: AdminStatus) -> Self {
        Self {
            id: id.into(),
            status,
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }
}

/// Persisted TOTP state for one admin.
#[derive(Clone, PartialEq, Eq)]
pub struct FactorRecord {
    pub admin_id: String,
    /// Base32 shared secret.
    pub secret: String,
    pub is_enabled: bool,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub disabled_at: Option<DateTime<Utc>>,
}

impl FactorRecord {
    /// Public view of the record, without the secret.
    pub fn status_view(&self) -> FactorStatusView {
        FactorStatusView {
            admin_id: self.admin_id.clone(),
            is_enabled: self.is_enabled,
            enrolled_at: self.enrolled_at,
            last_used_at: self.last_used_at,
            disabled_at: self.disabled_at,
        }
    }
}

impl fmt::Debug for FactorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactorRecord")
            .field("admin_id", &self.admin_id)
            .field("secret", &"<redacted>")
            .field("is_enabled", &self.is_enabled)
            .field("enrolled_at", &self.enrolled_at)
            .field("last_used_at", &self.last_used_at)
            .field("disabled_at", &self.disabled_at)
            .finish()
    }
}

/// Enrollment state as shown to callers. The secret is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorStatusView {
    pub admin_id: String,
    pub is_enabled: bool,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub disabled_at: Option<DateTime<Utc>>,
}

/// Why an enrollment was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollFailure {
    FeatureDisabled,
    AdminNotFound,
    AdminNotActive,
    AlreadyEnabled,
}

impl EnrollFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeatureDisabled => "feature_disabled",
            Self::AdminNotFound => "admin_not_found",
            Self::AdminNotActive => "admin_not_active",
            Self::AlreadyEnabled => "already_enabled",
        }
    }
}

/// Why a verification was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFailure {
    FeatureDisabled,
    AdminNotFound,
    NotEnabled,
    InvalidCode,
    CodeExpired,
}

impl VerifyFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeatureDisabled => "feature_disabled",
            Self::AdminNotFound => "admin_not_found",
            Self::NotEnabled => "not_enabled",
            Self::InvalidCode => "invalid_code",
            Self::CodeExpired => "code_expired",
        }
    }
}

/// Why a disable request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisableFailure {
    FeatureDisabled,
    NotEnabled,
}

impl DisableFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeatureDisabled => "feature_disabled",
            Self::NotEnabled => "not_enabled",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

display_as_str!(EnrollFailure, VerifyFailure, DisableFailure);

/// A freshly provisioned secret. Handed out once; it cannot be fetched again.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub secret: String,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// `otpauth://` URI for QR provisioning.
    pub fn provisioning_uri(&self, issuer: &str, account: &str) -> String {
        provisioning_uri(issuer, account, &self.secret)
    }
}

impl fmt::Debug for Enrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enrollment")
            .field("secret", &"<redacted>")
            .field("enrolled_at", &self.enrolled_at)
            .finish()
    }
}

/// Result of [`enroll`](super::FactorOrchestrator::enroll).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrollOutcome {
    Enrolled(Enrollment),
    Failed { reason: EnrollFailure },
}

impl EnrollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Enrolled(_))
    }

    pub fn failure(&self) -> Option<EnrollFailure> {
        match self {
            Self::Enrolled(_) => None,
            Self::Failed { reason } => Some(*reason),
        }
    }

    /// The provisioned secret, if enrollment succeeded.
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Enrolled(enrollment) => Some(&enrollment.secret),
            Self::Failed { .. } => None,
        }
    }
}

impl From<EnrollFailure> for EnrollOutcome {
    fn from(reason: EnrollFailure) -> Self {
        Self::Failed { reason }
    }
}

/// Result of [`verify`](super::FactorOrchestrator::verify).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    Verified,
    Failed { reason: VerifyFailure },
}

impl VerifyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn failure(&self) -> Option<VerifyFailure> {
        match self {
            Self::Verified => None,
            Self::Failed { reason } => Some(*reason),
        }
    }
}

impl From<VerifyFailure> for VerifyOutcome {
    fn from(reason: VerifyFailure) -> Self {
        Self::Failed { reason }
    }
}

/// Result of [`disable`](super::FactorOrchestrator::disable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DisableOutcome {
    Disabled,
    Failed { reason: DisableFailure },
}

impl DisableOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    pub fn failure(&self) -> Option<DisableFailure> {
        match self {
            Self::Disabled => None,
            Self::Failed { reason } => Some(*reason),
        }
    }
}

impl From<DisableFailure> for DisableOutcome {
    fn from(reason: DisableFailure) -> Self {
        Self::Failed { reason }
    }
}
