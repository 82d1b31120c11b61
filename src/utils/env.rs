/// Prefix checked before the bare variable name.
pub const ENV_PREFIX: &str = "ADMIN_TOTP_";

/// Get environment variable with the `ADMIN_TOTP_` prefix, falling back to the unprefixed name.
///
/// # Examples
///
/// ```rust
/// use admin_totp::utils::get_env_with_prefix;
///
/// // Checks ADMIN_TOTP_PAST_WINDOWS first, then PAST_WINDOWS
/// let past = get_env_with_prefix("PAST_WINDOWS");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, key))
        .or_else(|_| std::env::var(key))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("ADMIN_TOTP_ENV_TEST_VAR", "prefixed_value");
        }
        assert_eq!(
            get_env_with_prefix("ENV_TEST_VAR"),
            Some("prefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("ADMIN_TOTP_ENV_TEST_VAR");
        }

        unsafe {
            std::env::set_var("ENV_FALLBACK_VAR", "unprefixed_value");
        }
        assert_eq!(
            get_env_with_prefix("ENV_FALLBACK_VAR"),
            Some("unprefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("ENV_FALLBACK_VAR");
        }

        assert_eq!(get_env_with_prefix("ENV_NON_EXISTENT_VAR"), None);
    }
}
