/// The error type for faults raised by this crate.
///
/// Business outcomes such as an unknown admin or a wrong code are not errors;
/// they are reported through the outcome types in [`crate::factor`]. A
/// `TotpError` means either the caller broke an input contract or a
/// collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TotpError {
    #[error("Invalid counter: {0} (must not be negative)")]
    NegativeCounter(i64),

    #[error("TOTP code cannot be empty")]
    EmptyCode,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TotpError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error signals a caller contract violation rather than
    /// an infrastructure failure.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::NegativeCounter(_) | Self::EmptyCode)
    }
}

pub type Result<T, E = TotpError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TotpError::NegativeCounter(-1).to_string(),
            "Invalid counter: -1 (must not be negative)"
        );
        assert_eq!(TotpError::EmptyCode.to_string(), "TOTP code cannot be empty");
        assert_eq!(
            TotpError::storage("connection reset").to_string(),
            "Storage error: connection reset"
        );
    }

    #[test]
    fn test_input_error_classification() {
        assert!(TotpError::NegativeCounter(-5).is_input_error());
        assert!(TotpError::EmptyCode.is_input_error());
        assert!(!TotpError::storage("down").is_input_error());
        assert!(!TotpError::config("bad").is_input_error());
    }
}
