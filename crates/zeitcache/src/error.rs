//! Error types for zeitcache.
//!
//! Every public entry point returns [`Result`]. Errors are never swallowed or
//! retried inside the library; the caller always receives the typed failure.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for zeitcache.
#[derive(Debug, Error)]
pub enum ZeitError {
    // Usage errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Refusing to cache unsupported value of type {type_name}")]
    UnsupportedType { type_name: String },

    // File system, compression and container errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Failures raised by a caller-supplied transformation
    #[error("Transformation failed: {message}")]
    Transform {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for zeitcache operations.
pub type Result<T> = std::result::Result<T, ZeitError>;

impl From<std::io::Error> for ZeitError {
    fn from(err: std::io::Error) -> Self {
        ZeitError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ZeitError {
    fn from(err: serde_json::Error) -> Self {
        ZeitError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ZeitError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ZeitError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an IO error for malformed stored bytes.
    pub fn corrupt(message: impl Into<String>) -> Self {
        let message = message.into();
        ZeitError::Io {
            source: Some(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                message.clone(),
            )),
            message,
            path: None,
        }
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ZeitError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ZeitError::Config {
            message: message.into(),
        }
    }

    /// Wrap an error raised by a transformation closure.
    pub fn transform<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ZeitError::Transform {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Attach a path to an IO error that does not carry one yet.
    pub fn at_path(self, at: impl Into<PathBuf>) -> Self {
        match self {
            ZeitError::Io {
                message,
                path: None,
                source,
            } => ZeitError::Io {
                message,
                path: Some(at.into()),
                source,
            },
            other => other,
        }
    }

    /// Returns true for errors caused by caller input rather than the environment.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ZeitError::Config { .. }
                | ZeitError::Validation { .. }
                | ZeitError::UnsupportedType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZeitError::validation("name", "DataArray has no name");
        assert_eq!(
            err.to_string(),
            "Validation error for name: DataArray has no name"
        );
    }

    #[test]
    fn test_io_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ZeitError::io_with_path(io, "/tmp/cache");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("denied"));
        assert!(err.to_string().contains("/tmp/cache"));
    }

    #[test]
    fn test_at_path_only_fills_missing() {
        let err = ZeitError::corrupt("bad magic").at_path("/a");
        match &err {
            ZeitError::Io { path, .. } => assert_eq!(path.as_deref(), Some("/a".as_ref())),
            other => panic!("unexpected {other:?}"),
        }
        let err = err.at_path("/b");
        assert!(err.to_string().contains("/a"));
    }

    #[test]
    fn test_json_error_is_not_corrupt_data() {
        let err: ZeitError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, ZeitError::Json { source: Some(_), .. }));
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_usage_errors() {
        assert!(ZeitError::config("bare").is_usage_error());
        assert!(ZeitError::UnsupportedType {
            type_name: "i32".into()
        }
        .is_usage_error());
        assert!(!ZeitError::corrupt("x").is_usage_error());
    }
}
