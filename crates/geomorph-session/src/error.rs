//! Error types for the GeoMorph session runtime.
//!
//! Most errors in this crate never reach the learner: the runtime swallows
//! them on the paths where the session must keep going (bootstrap, monitor
//! polls, submissions, completion). They are still typed so every call site
//! decides explicitly what a failure means.

use std::path::PathBuf;

/// A specialized `Result` type for session operations.
pub type Result<T> = std::result::Result<T, GeomorphError>;

/// Errors that can occur while running a tutoring session.
#[derive(Debug, thiserror::Error)]
pub enum GeomorphError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your geomorph.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Evaluator Errors
    // ========================================================================
    /// The request never produced a response (connection refused, timeout).
    #[error("Request to {endpoint} failed: {message}")]
    Transport {
        /// Endpoint path relative to the API root.
        endpoint: String,
        /// Description of the transport failure.
        message: String,
    },

    /// The evaluator answered with a non-success status.
    ///
    /// Displays as `API Failed (<status>): <body>`, the diagnostic the
    /// question feed shows in place of a question.
    #[error("API Failed ({status}): {body}")]
    HttpStatus {
        /// Endpoint path relative to the API root.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path relative to the API root.
        endpoint: String,
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // Runtime Errors
    // ========================================================================
    /// The session runtime has stopped and no longer accepts commands.
    #[error("Session runtime is no longer running")]
    RuntimeClosed,

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeomorphError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Creates a new `HttpStatus` error.
    #[must_use]
    pub fn http_status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` if this error is transient and the next routine request
    /// may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this error prevents a session from starting at all.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. } | Self::ConfigValidationError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_matches_feed_diagnostic() {
        let err = GeomorphError::http_status("content/next", 500, "model offline");
        assert_eq!(err.to_string(), "API Failed (500): model offline");
    }

    #[test]
    fn test_config_error_display() {
        let err = GeomorphError::config_validation("topic must not be empty", "Set topic");
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("Suggestion: Set topic"));
    }

    #[test]
    fn test_is_transient() {
        assert!(GeomorphError::transport("session/current", "connection refused").is_transient());
        assert!(GeomorphError::http_status("learning/monitor", 503, "").is_transient());
        assert!(GeomorphError::http_status("learning/monitor", 429, "").is_transient());
        assert!(!GeomorphError::http_status("content/next", 404, "").is_transient());
        assert!(!GeomorphError::decode("content/next", "missing field").is_transient());
    }

    #[test]
    fn test_is_fatal() {
        assert!(GeomorphError::config_parse("geomorph.json", "eof").is_fatal());
        assert!(GeomorphError::config_validation("bad", "fix").is_fatal());
        assert!(!GeomorphError::RuntimeClosed.is_fatal());
        assert!(!GeomorphError::transport("x", "y").is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GeomorphError = io_err.into();
        assert!(matches!(err, GeomorphError::Io(_)));
    }
}
