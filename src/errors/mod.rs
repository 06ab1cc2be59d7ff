//! Domain-specific error types for the Volley load generator
//!
//! Configuration problems are fatal and surface before any worker starts.
//! Per-request transport failures never travel through this type; they are
//! recorded as data in the report instead.

use thiserror::Error;

/// Main error type for the Volley application
#[derive(Error, Debug)]
pub enum VolleyError {
    /// Configuration-related errors (CLI parsing, validation, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport setup errors (client construction, TLS backend, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Run execution errors (worker panics, lost aggregator, etc.)
    #[error("Execution error: {0}")]
    Execution(String),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type using VolleyError
pub type Result<T> = std::result::Result<T, VolleyError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn with_config_context(self, msg: &str) -> Result<T>;
    fn with_transport_context(self, msg: &str) -> Result<T>;
    fn with_execution_context(self, msg: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_config_context(self, msg: &str) -> Result<T> {
        self.map_err(|e| VolleyError::Config(format!("{}: {}", msg, e)))
    }

    fn with_transport_context(self, msg: &str) -> Result<T> {
        self.map_err(|e| VolleyError::Transport(format!("{}: {}", msg, e)))
    }

    fn with_execution_context(self, msg: &str) -> Result<T> {
        self.map_err(|e| VolleyError::Execution(format!("{}: {}", msg, e)))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn with_config_context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| VolleyError::Config(msg.to_string()))
    }

    fn with_transport_context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| VolleyError::Transport(msg.to_string()))
    }

    fn with_execution_context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| VolleyError::Execution(msg.to_string()))
    }
}

// Convenience constructors
impl VolleyError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        VolleyError::Config(msg.into())
    }

    pub fn execution<S: Into<String>>(msg: S) -> Self {
        VolleyError::Execution(msg.into())
    }

    /// True for errors that should be reported as bad input rather than a crash
    pub fn is_config(&self) -> bool {
        matches!(self, VolleyError::Config(_) | VolleyError::UrlParse(_))
    }
}
