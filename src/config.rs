use serde::{Deserialize, Serialize};

use crate::error::{Result, TotpError};
use crate::totp::{DEFAULT_SECRET_BYTES, WindowPolicy};
use crate::utils::get_env_with_prefix;

/// Smallest accepted secret length in bytes (80 bits).
pub const MIN_SECRET_BYTES: usize = 10;

/// Largest accepted drift window on either side, in time steps.
pub const MAX_WINDOWS: i64 = 10;

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub totp: TotpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TOTP factor settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TotpConfig {
    /// Accepted time steps before the current one (negative values clamp to 0).
    #[serde(default = "default_window")]
    pub past_windows: i64,
    /// Accepted time steps after the current one (negative values clamp to 0).
    #[serde(default = "default_window")]
    pub future_windows: i64,
    /// Random bytes per generated secret.
    #[serde(default = "default_secret_bytes")]
    pub secret_bytes: usize,
    /// Issuer shown in authenticator apps.
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            past_windows: default_window(),
            future_windows: default_window(),
            secret_bytes: default_secret_bytes(),
            issuer: default_issuer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl TotpConfig {
    /// Drift window derived from the configured step counts.
    pub fn window_policy(&self) -> WindowPolicy {
        WindowPolicy::new(self.past_windows, self.future_windows)
    }
}

fn default_window() -> i64 {
    1
}

fn default_secret_bytes() -> usize {
    DEFAULT_SECRET_BYTES
}

fn default_issuer() -> String {
    "Admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_past_windows(mut self, past_windows: i64) -> Self {
        self.config.totp.past_windows = past_windows;
        self
    }

    pub fn with_future_windows(mut self, future_windows: i64) -> Self {
        self.config.totp.future_windows = future_windows;
        self
    }

    pub fn with_secret_bytes(mut self, secret_bytes: usize) -> Self {
        self.config.totp.secret_bytes = secret_bytes;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.config.totp.issuer = issuer.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    /// Load configuration from environment variables with ADMIN_TOTP_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(past) = get_env_with_prefix("PAST_WINDOWS") {
            if let Ok(p) = past.parse() {
                self.config.totp.past_windows = p;
            }
        }
        if let Some(future) = get_env_with_prefix("FUTURE_WINDOWS") {
            if let Ok(f) = future.parse() {
                self.config.totp.future_windows = f;
            }
        }
        if let Some(bytes) = get_env_with_prefix("SECRET_BYTES") {
            if let Ok(b) = bytes.parse() {
                self.config.totp.secret_bytes = b;
            }
        }
        if let Some(issuer) = get_env_with_prefix("ISSUER") {
            self.config.totp.issuer = issuer;
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns [`TotpError::Config`] if:
    /// - the log level is unknown
    /// - a drift window exceeds 10 steps
    /// - the secret length is below 10 bytes
    /// - the issuer is empty or contains ':'
    pub fn build(self) -> Result<Config> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(TotpError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        // Each accepted step costs one HMAC per verification
        for (name, value) in [
            ("past_windows", self.config.totp.past_windows),
            ("future_windows", self.config.totp.future_windows),
        ] {
            if value > MAX_WINDOWS {
                return Err(TotpError::config(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_WINDOWS, value
                )));
            }
        }

        if self.config.totp.secret_bytes < MIN_SECRET_BYTES {
            return Err(TotpError::config(format!(
                "Secret length must be at least {} bytes, got {}",
                MIN_SECRET_BYTES, self.config.totp.secret_bytes
            )));
        }

        // ':' separates issuer and account in the otpauth label
        let issuer = self.config.totp.issuer.trim();
        if issuer.is_empty() || issuer.contains(':') {
            return Err(TotpError::config(format!(
                "Issuer must be non-empty and must not contain ':', got {:?}",
                self.config.totp.issuer
            )));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.totp.past_windows, 1);
        assert_eq!(config.totp.future_windows, 1);
        assert_eq!(config.totp.secret_bytes, 20);
        assert_eq!(config.totp.issuer, "Admin");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.totp.window_policy(), WindowPolicy::default());
    }

    #[test]
    fn test_negative_windows_clamp_in_policy() {
        let config = ConfigBuilder::new()
            .with_past_windows(-3)
            .with_future_windows(2)
            .build()
            .unwrap();
        let policy = config.totp.window_policy();
        assert_eq!(policy.past_windows(), 0);
        assert_eq!(policy.future_windows(), 2);
    }

    #[test]
    fn test_oversized_windows_rejected() {
        let err = ConfigBuilder::new()
            .with_past_windows(4_000_000_000)
            .build()
            .unwrap_err();
        assert!(matches!(err, TotpError::Config(ref msg) if msg.contains("past_windows")));

        let err = ConfigBuilder::new().with_future_windows(11).build().unwrap_err();
        assert!(matches!(err, TotpError::Config(ref msg) if msg.contains("future_windows")));

        let config = ConfigBuilder::new()
            .with_past_windows(MAX_WINDOWS)
            .with_future_windows(MAX_WINDOWS)
            .build()
            .unwrap();
        assert_eq!(config.totp.window_policy().max_checks(), 22);
    }

    #[test]
    fn test_invalid_log_level() {
        let err = ConfigBuilder::new().with_log_level("verbose").build().unwrap_err();
        assert!(matches!(err, TotpError::Config(_)));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(ConfigBuilder::new().with_secret_bytes(8).build().is_err());
        assert!(ConfigBuilder::new().with_secret_bytes(10).build().is_ok());
    }

    #[test]
    fn test_issuer_validation() {
        assert!(ConfigBuilder::new().with_issuer("").build().is_err());
        assert!(ConfigBuilder::new().with_issuer("Acme:Prod").build().is_err());
        assert!(ConfigBuilder::new().with_issuer("Acme Prod").build().is_ok());
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("ADMIN_TOTP_PAST_WINDOWS", "2");
            std::env::set_var("ADMIN_TOTP_FUTURE_WINDOWS", "not-a-number");
            std::env::set_var("ADMIN_TOTP_ISSUER", "Backoffice");
        }

        let config = ConfigBuilder::new().from_env().build().unwrap();
        assert_eq!(config.totp.past_windows, 2);
        assert_eq!(config.totp.future_windows, 1);
        assert_eq!(config.totp.issuer, "Backoffice");

        unsafe {
            std::env::remove_var("ADMIN_TOTP_PAST_WINDOWS");
            std::env::remove_var("ADMIN_TOTP_FUTURE_WINDOWS");
            std::env::remove_var("ADMIN_TOTP_ISSUER");
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let config: Config = serde_json::from_str(r#"{"totp":{"past_windows":4}}"#).unwrap();
        assert_eq!(config.totp.past_windows, 4);
        assert_eq!(config.totp.future_windows, 1);
        assert_eq!(config.logging.level, "info");
    }
}
