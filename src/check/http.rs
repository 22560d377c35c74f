//! HTTP probe check.
//!
//! Sends one request per invocation and decides pass/fail from the response:
//! the decimal status code must fully match the configured status pattern,
//! then the raw body bytes must match the body pattern. With redirects
//! disallowed the client refuses to follow them and the redirect response
//! itself goes through the same evaluation.

use std::fmt;

use async_trait::async_trait;
use regex::bytes;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client, Method, StatusCode, Url};
use tracing::{debug, trace, warn};

use super::{Check, CheckError};
use crate::config::{parse_header, ConfigError, HttpCheckConfig};

/// Longest body excerpt included in log lines.
const BODY_LOG_LIMIT: usize = 50;

/// Error type for a failed HTTP check run.
///
/// Construction problems never show up here; they are rejected as
/// [`ConfigError`] before a check exists.
#[derive(Debug)]
pub enum HttpCheckError {
    /// The request could not be sent or the transport failed mid-flight,
    /// including a hit timeout.
    Request(reqwest::Error),
    /// The response body could not be read.
    Read(reqwest::Error),
    /// A redirect response was refused because redirects are disallowed.
    RedirectRefused { status: StatusCode },
    /// The status code did not match the configured pattern.
    UnexpectedStatus { status: StatusCode },
    /// The body did not match the configured pattern.
    UnexpectedBody,
}

impl fmt::Display for HttpCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpCheckError::Request(error) => write!(f, "http request failed: {}", error),
            HttpCheckError::Read(error) => {
                write!(f, "failed to read response body: {}", error)
            }
            HttpCheckError::RedirectRefused { status } => {
                write!(
                    f,
                    "server tried to redirect ({}) and redirects are not allowed",
                    status.as_u16()
                )
            }
            HttpCheckError::UnexpectedStatus { status } => {
                write!(f, "incorrect status code: {}", status.as_u16())
            }
            HttpCheckError::UnexpectedBody => write!(f, "incorrect response body"),
        }
    }
}

impl std::error::Error for HttpCheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpCheckError::Request(error) | HttpCheckError::Read(error) => Some(error),
            _ => None,
        }
    }
}

/// One configured HTTP health check target.
///
/// Everything user-provided is validated and compiled up front, so each
/// [`HttpCheck::execute`] call only sends the request and evaluates the
/// response.
#[derive(Debug)]
pub struct HttpCheck {
    url: Url,
    method: Method,
    headers: HeaderMap,
    allow_redirects: bool,
    status_pattern: Regex,
    body_pattern: bytes::Regex,
    client: Client,
}

impl HttpCheck {
    /// Validates `config` and builds the HTTP client.
    pub fn new(config: HttpCheckConfig) -> Result<Self, ConfigError> {
        let url = Url::parse(&config.url).map_err(|error| ConfigError::InvalidUrl {
            url: config.url.clone(),
            error: error.to_string(),
        })?;

        let method =
            Method::from_bytes(config.method.as_bytes()).map_err(|_| ConfigError::InvalidMethod {
                method: config.method.clone(),
            })?;

        let mut headers = HeaderMap::new();
        for raw in &config.headers {
            let (name, value) = parse_header(raw)?;
            let name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeader {
                    header: raw.clone(),
                })?;
            let value = HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader {
                header: raw.clone(),
            })?;
            trace!("Adding request header {}", name);
            headers.append(name, value);
        }

        // The status code must be matched in full, the body anywhere
        let status_pattern = Regex::new(&format!("^(?:{})$", config.status_pattern)).map_err(
            |error| ConfigError::InvalidPattern {
                what: "status code",
                pattern: config.status_pattern.clone(),
                error: error.to_string(),
            },
        )?;
        let body_pattern =
            bytes::Regex::new(&config.body_pattern).map_err(|error| ConfigError::InvalidPattern {
                what: "response body",
                pattern: config.body_pattern.clone(),
                error: error.to_string(),
            })?;

        debug!("Building HTTP client");
        let mut builder = Client::builder().redirect(if config.allow_redirects {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        });
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }
        let client = builder.build().map_err(|error| ConfigError::Client {
            error: error.to_string(),
        })?;

        Ok(Self {
            url,
            method,
            headers,
            allow_redirects: config.allow_redirects,
            status_pattern,
            body_pattern,
            client,
        })
    }

    /// Sends the request and evaluates the response.
    pub async fn execute(&self) -> Result<(), HttpCheckError> {
        debug!("Executing {} request for {}", self.method, self.url);
        let response = self
            .client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(HttpCheckError::Request)?;

        let status = response.status();
        debug!(
            "Checking status code {} against {}",
            status.as_str(),
            self.status_pattern
        );
        if !self.status_pattern.is_match(status.as_str()) {
            if status.is_redirection() && !self.allow_redirects {
                warn!("Server redirected ({}) with redirects disabled", status.as_u16());
                return Err(HttpCheckError::RedirectRefused { status });
            }
            warn!("Status code {} did not match", status.as_u16());
            return Err(HttpCheckError::UnexpectedStatus { status });
        }

        debug!("Reading response body");
        let body = response.bytes().await.map_err(HttpCheckError::Read)?;

        debug!(
            "Checking response body '{}' against {}",
            body_excerpt(&body),
            self.body_pattern
        );
        if !self.body_pattern.is_match(&body) {
            warn!("Response body did not match");
            return Err(HttpCheckError::UnexpectedBody);
        }

        Ok(())
    }
}

#[async_trait]
impl Check for HttpCheck {
    async fn run(&self) -> Result<(), CheckError> {
        self.execute().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// First bytes of the body as printable text for log lines.
fn body_excerpt(body: &[u8]) -> String {
    let end = body.len().min(BODY_LOG_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
