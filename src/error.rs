//! Error types for layerpak
//!
//! All modules use `PakResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for layerpak operations
pub type PakResult<T> = Result<T, PakError>;

/// All errors that can occur in layerpak
#[derive(Error, Debug)]
pub enum PakError {
    // Configuration errors
    #[error("Invalid version constraint '{constraint}': {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Invalid value for ${name}: '{value}' is not a whole number of seconds")]
    InvalidTimeout { name: String, value: String },

    #[error("Invalid checksum '{0}'")]
    InvalidChecksum(String),

    #[error("Unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid buildpack metadata in {context}: {reason}")]
    MetadataInvalid { context: String, reason: String },

    // Resolution errors
    #[error("no valid dependencies for {id}, {constraint}, and {platform} in [{candidates}]")]
    NoValidDependency {
        id: String,
        constraint: String,
        platform: String,
        candidates: String,
    },

    #[error("unable to compare metadata: {0}")]
    MetadataCompare(String),

    // Download errors
    #[error("Invalid URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Unsupported URI scheme for {uri}")]
    UnsupportedScheme { uri: String },

    #[error("Unable to download {uri}: {reason}")]
    Download { uri: String, reason: String },

    #[error("Could not download {uri}: {status}")]
    HttpStatus { uri: String, status: u16 },

    #[error("checksum for {uri} {actual} does not match expected {expected}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    // General errors
    #[error("{0}")]
    User(String),
}

impl PakError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a metadata error for the given location
    pub fn metadata(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::MetadataInvalid {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error stems from malformed configuration rather than runtime state
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConstraint { .. }
                | Self::InvalidVersion { .. }
                | Self::InvalidTimeout { .. }
                | Self::InvalidChecksum(_)
                | Self::UnsupportedAlgorithm(_)
                | Self::MetadataInvalid { .. }
        )
    }

    /// Whether no catalogue entry satisfied a resolution request
    pub fn is_no_valid_dependency(&self) -> bool {
        matches!(self, Self::NoValidDependency { .. })
    }

    /// Whether a downloaded artifact failed verification
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConstraint { .. } => {
                Some("Use a semver range such as '11.*', '~1.2' or '>=1.0, <2.0'")
            }
            Self::InvalidTimeout { .. } => Some("Timeouts are integer seconds, e.g. BP_DIALER_TIMEOUT=10"),
            Self::NoValidDependency { .. } => {
                Some("Check the requested version and CNB_STACK_ID against buildpack.toml")
            }
            Self::ChecksumMismatch { .. } => {
                Some("The download was corrupted or tampered with; verify the mirror or mapping")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PakError::InvalidTimeout {
            name: "BP_DIALER_TIMEOUT".to_string(),
            value: "soon".to_string(),
        };
        assert!(err.to_string().contains("$BP_DIALER_TIMEOUT"));
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn error_hint() {
        let err = PakError::ChecksumMismatch {
            uri: "https://example.com/a.tgz".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(err.hint().unwrap().contains("tampered"));
        assert_eq!(PakError::User("x".to_string()).hint(), None);
    }

    #[test]
    fn error_classification() {
        let constraint = PakError::InvalidConstraint {
            constraint: "!!".to_string(),
            reason: "bad".to_string(),
        };
        assert!(constraint.is_config_error());
        assert!(!constraint.is_no_valid_dependency());

        let missing = PakError::NoValidDependency {
            id: "jre".to_string(),
            constraint: "*".to_string(),
            platform: "linux".to_string(),
            candidates: String::new(),
        };
        assert!(missing.is_no_valid_dependency());
        assert!(!missing.is_config_error());
        assert!(!missing.is_integrity_error());
    }
}
