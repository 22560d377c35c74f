//! Configuration error types.

use std::fmt;

/// Error type for check configuration.
///
/// All of these are startup errors: a configuration that cannot produce a
/// runnable check is rejected before the daemon binds anything.
#[derive(Debug)]
pub enum ConfigError {
    /// Header string without a `Name: Value` shape, or with a name or value
    /// the HTTP layer rejects.
    InvalidHeader { header: String },
    /// HTTP method containing characters that are not valid in a method
    /// token.
    InvalidMethod { method: String },
    /// Target URL failed to parse.
    InvalidUrl { url: String, error: String },
    /// Status-code or body pattern failed to compile.
    InvalidPattern {
        what: &'static str,
        pattern: String,
        error: String,
    },
    /// HTTP client construction failed.
    Client { error: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHeader { header } => {
                write!(f, "invalid http header '{}'", header)
            }
            ConfigError::InvalidMethod { method } => {
                write!(f, "invalid http method '{}'", method)
            }
            ConfigError::InvalidUrl { url, error } => {
                write!(f, "invalid url '{}': {}", url, error)
            }
            ConfigError::InvalidPattern {
                what,
                pattern,
                error,
            } => {
                write!(f, "invalid {} pattern '{}': {}", what, pattern, error)
            }
            ConfigError::Client { error } => {
                write!(f, "failed to build http client: {}", error)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
