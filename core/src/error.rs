use thiserror::Error;

/// Tagkeep error types
#[derive(Error, Debug)]
pub enum KeepError {
    /// A policy definition failed validation
    #[error("Invalid policy `{policy}`: field `{field}` {message}")]
    InvalidPolicy {
        policy: String,
        field: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Container registry error
    #[error("Registry error: {repository} - {message}")]
    RegistryError { repository: String, message: String },

    /// An image slated for deletion is still referenced by a running workload
    #[error("Image in use: {repository}@{digest}")]
    ImageInUse { repository: String, digest: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl KeepError {
    /// Build an `InvalidPolicy` error for the given policy and field.
    pub fn invalid_policy(
        policy: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        KeepError::InvalidPolicy {
            policy: policy.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for KeepError {
    fn from(err: serde_json::Error) -> Self {
        KeepError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for KeepError {
    fn from(err: serde_yaml::Error) -> Self {
        KeepError::SerializationError(err.to_string())
    }
}

/// Result type alias for tagkeep operations
pub type Result<T> = std::result::Result<T, KeepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_policy_display_names_policy_and_field() {
        let error = KeepError::invalid_policy("nightly", "protected_count", "must not be negative");
        assert_eq!(
            error.to_string(),
            "Invalid policy `nightly`: field `protected_count` must not be negative"
        );
    }

    #[test]
    fn test_config_error_display() {
        let error = KeepError::ConfigError("Missing policy file".to_string());
        assert_eq!(error.to_string(), "Configuration error: Missing policy file");
    }

    #[test]
    fn test_registry_error_display() {
        let error = KeepError::RegistryError {
            repository: "backend".to_string(),
            message: "Repository not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Registry error: backend - Repository not found"
        );
    }

    #[test]
    fn test_image_in_use_display() {
        let error = KeepError::ImageInUse {
            repository: "backend".to_string(),
            digest: "sha256:abc".to_string(),
        };
        assert_eq!(error.to_string(), "Image in use: backend@sha256:abc");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: KeepError = io_error.into();
        assert!(matches!(error, KeepError::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ invalid");
        let error: KeepError = result.unwrap_err().into();
        assert!(matches!(error, KeepError::SerializationError(_)));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let error: KeepError = result.unwrap_err().into();
        assert!(matches!(error, KeepError::SerializationError(_)));
    }

    #[test]
    fn test_other_error_display() {
        let error = KeepError::Other("Unknown error occurred".to_string());
        assert_eq!(error.to_string(), "Unknown error occurred");
    }
}
