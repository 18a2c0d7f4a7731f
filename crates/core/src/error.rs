//! Error types for Reward Rotor
//! 
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for Reward Rotor
#[derive(Error, Debug)]
pub enum RotorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Controller shut down")]
    Closed,
}

/// Result type alias for Reward Rotor operations
pub type Result<T> = std::result::Result<T, RotorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = RotorError::Config("ad unit id is blank".into());
        assert_eq!(err.to_string(), "Configuration error: ad unit id is blank");
        assert_eq!(RotorError::Closed.to_string(), "Controller shut down");
    }

    #[test]
    fn test_toml_error_converts() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("version = ");
        let err: RotorError = parse.unwrap_err().into();
        assert!(matches!(err, RotorError::TomlParse(_)));
    }
}
