//! Command-line surface.
//!
//! Every check flag also binds to a `CHECK_*` environment variable; a flag
//! value wins over the environment, which wins over the default.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{self, HttpCheckConfig};

#[derive(Debug, Parser)]
#[command(
    name = "healthchecker",
    version = crate::VERSION,
    about = "Check the health of an external service"
)]
pub struct Cli {
    /// Path of the unix socket shared by `serve` and `check`
    #[arg(
        long,
        global = true,
        env = "CHECK_SOCKET",
        default_value = config::DEFAULT_SOCKET_PATH
    )]
    pub socket: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Wait for check requests on the socket and answer each one
    Serve {
        #[command(subcommand)]
        check: ServeCheck,
    },
    /// Query a running daemon for the current verdict
    Check,
    /// Run the HTTP health check once, without a daemon
    Http(HttpArgs),
    /// Wait for an interrupt signal, then exit
    Wait,
}

/// Concrete check the daemon performs.
#[derive(Debug, Subcommand)]
pub enum ServeCheck {
    /// Check service status with an HTTP request
    Http(HttpArgs),
}

/// Flags of the HTTP health check, shared by `serve http` and `http`.
#[derive(Debug, Args)]
pub struct HttpArgs {
    /// URL of the health check endpoint
    #[arg(short = 'u', long, env = "CHECK_URL")]
    pub url: String,

    /// HTTP method to use
    #[arg(short = 'm', long, env = "CHECK_METHOD", default_value = "GET")]
    pub method: String,

    /// Header to add to the request as 'Name: Value' (repeatable)
    #[arg(long = "header", env = "CHECK_HEADERS", value_delimiter = ',')]
    pub headers: Vec<String>,

    /// Follow redirects instead of failing on them
    #[arg(long, env = "CHECK_ALLOW_REDIRECTS")]
    pub allow_redirects: bool,

    /// Time to wait for a response ("500ms", "30s", "2m"; 0 disables)
    #[arg(
        long,
        env = "CHECK_TIMEOUT",
        default_value = "30s",
        value_parser = config::parse_duration
    )]
    pub timeout: Duration,

    /// Regular expression the status code must fully match
    #[arg(
        long = "status-code",
        env = "CHECK_STATUS_CODE",
        default_value = config::DEFAULT_STATUS_PATTERN
    )]
    pub status_code: String,

    /// Regular expression the response body must match
    #[arg(long, env = "CHECK_RESPONSE", default_value = config::DEFAULT_BODY_PATTERN)]
    pub response: String,
}

impl From<HttpArgs> for HttpCheckConfig {
    fn from(args: HttpArgs) -> Self {
        HttpCheckConfig {
            url: args.url,
            method: args.method,
            headers: args.headers,
            allow_redirects: args.allow_redirects,
            timeout: args.timeout,
            status_pattern: args.status_code,
            body_pattern: args.response,
        }
    }
}
