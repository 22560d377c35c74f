//! healthchecker - Out-of-band health checks for long-running services.
//!
//! A `serve` daemon owns a unix socket and performs the expensive probe (an
//! outbound HTTP request) once per incoming connection, answering with a
//! single verdict byte. The `check` client connects, reads that byte, and
//! turns it into an exit code, so a container orchestrator's liveness
//! command stays cheap no matter what the real check costs.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐ unix socket ┌────────────────┐   HTTP    ┌──────────┐
//! │   check    │────────────▶│  serve daemon  │──────────▶│ upstream │
//! │  (client)  │◀────────────│  (accept loop) │◀──────────│ service  │
//! └────────────┘ verdict byte└────────────────┘  response └──────────┘
//! ```
//!
//! The daemon serves connections strictly one at a time and is generic over
//! the [`check::Check`] trait, so probe types other than HTTP can plug in.
//!
//! # Example
//!
//! ```rust,ignore
//! use healthchecker::check::HttpCheck;
//! use healthchecker::config::HttpCheckConfig;
//! use healthchecker::server::{Server, Shutdown};
//!
//! let check = HttpCheck::new(HttpCheckConfig::new("http://localhost:8080/health"))?;
//! let server = Server::new("/tmp/healthchecker.sock", check);
//! server.run(Shutdown::new()).await?;
//! ```

/// Full version string, package version plus the short git commit hash
/// emitted by build.rs: "0.1.0 (abc12345)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod check;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod server;

// Re-exports for convenience
pub use protocol::Verdict;
pub use server::{Server, Shutdown};
