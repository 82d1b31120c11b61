//! `otpauth://` provisioning URIs for authenticator apps.
//!
//! Follows the Key URI format understood by Google Authenticator and
//! compatible apps. Algorithm, digits and period are always advertised so
//! apps never fall back to their own defaults.

use super::code::{CODE_DIGITS, TIME_STEP_SECONDS};

/// Build the provisioning URI for a secret.
///
/// Issuer and account are percent-encoded (spaces become `%20`) in both the
/// label and the query. Trailing `=` padding is stripped from the secret
/// since several apps reject padded values.
pub fn provisioning_uri(issuer: &str, account: &str, secret: &str) -> String {
    let issuer = urlencoding::encode(issuer);
    format!(
        "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits={}&period={}",
        issuer,
        urlencoding::encode(account),
        secret.trim_end_matches('='),
        issuer,
        CODE_DIGITS,
        TIME_STEP_SECONDS,
    )
}
