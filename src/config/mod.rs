//! Check configuration.
//!
//! [`HttpCheckConfig`] carries the check settings exactly as given on the
//! command line or in the environment; validation happens when a check is
//! built from it, so every malformed input surfaces as a startup
//! [`ConfigError`] rather than a per-request failure.

mod error;

pub use error::ConfigError;

use std::time::Duration;

/// Default socket path shared by `serve` and `check`.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/healthchecker.sock";

/// Default request timeout for the HTTP check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default pattern the decimal status code must fully match.
pub const DEFAULT_STATUS_PATTERN: &str = "^200$";

/// Default pattern matched against the raw response body.
pub const DEFAULT_BODY_PATTERN: &str = ".*";

/// Settings for one HTTP health check target.
#[derive(Debug, Clone)]
pub struct HttpCheckConfig {
    /// URL of the health check endpoint.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// Raw `Name: Value` header strings, in the order given.
    pub headers: Vec<String>,
    /// Follow redirects instead of refusing them.
    pub allow_redirects: bool,
    /// Request timeout; zero disables it.
    pub timeout: Duration,
    /// Regular expression the decimal status code must fully match.
    pub status_pattern: String,
    /// Regular expression the response body must match.
    pub body_pattern: String,
}

impl HttpCheckConfig {
    /// Creates a config for `url` with every other setting at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: Vec::new(),
            allow_redirects: false,
            timeout: DEFAULT_TIMEOUT,
            status_pattern: DEFAULT_STATUS_PATTERN.to_string(),
            body_pattern: DEFAULT_BODY_PATTERN.to_string(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    pub fn with_allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = allow;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_status_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.status_pattern = pattern.into();
        self
    }

    pub fn with_body_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.body_pattern = pattern.into();
        self
    }
}

/// Splits a raw `Name: Value` header string on the first colon.
///
/// Leading spaces are trimmed from the value. A string without any colon is
/// a configuration error.
pub fn parse_header(raw: &str) -> Result<(&str, &str), ConfigError> {
    match raw.split_once(':') {
        Some((name, value)) => Ok((name, value.trim_start_matches(' '))),
        None => Err(ConfigError::InvalidHeader {
            header: raw.to_string(),
        }),
    }
}

/// Parses a duration flag value ("300ms", "30s", "2m", "1h", or bare
/// seconds). "0" and "off" disable the timeout.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    if s == "off" || s == "0" || s.is_empty() {
        return Ok(Duration::ZERO);
    }

    // "ms" before "s", it ends with the same letter
    if let Some(num_str) = s.strip_suffix("ms") {
        let num: u64 = num_str
            .parse()
            .map_err(|_| format!("invalid number: {}", num_str))?;
        return Ok(Duration::from_millis(num));
    }

    let (num_str, secs_per_unit) = if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else {
        // Bare number counts as seconds
        return s
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| format!("invalid duration: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: {}", s))
}
