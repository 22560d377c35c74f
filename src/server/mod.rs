//! Unix-socket daemon serving health check verdicts.
//!
//! [`Server`] binds the socket path and serves connections strictly one at a
//! time: accept, run the injected check, write one verdict byte, close. The
//! daemon represents a single logical health state, so there is no
//! per-connection concurrency. A [`Shutdown`] handle shared with the signal
//! watcher ends the loop.

pub mod shutdown;

use std::fmt;
use std::io;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

pub use shutdown::{spawn_signal_watcher, wait_for_signal, Shutdown};

use crate::check::Check;
use crate::protocol::Verdict;

/// Error type for daemon startup.
#[derive(Debug)]
pub enum ServeError {
    /// Binding the socket path failed. There is no retry; a misconfigured
    /// path never self-heals.
    Bind { path: PathBuf, error: io::Error },
    /// Registering the SIGINT/SIGTERM handlers failed.
    Signal { error: io::Error },
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::Bind { path, error } => {
                write!(f, "failed to bind socket '{}': {}", path.display(), error)
            }
            ServeError::Signal { error } => {
                write!(f, "failed to register signal handlers: {}", error)
            }
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServeError::Bind { error, .. } | ServeError::Signal { error } => Some(error),
        }
    }
}

/// Health check daemon over a Unix socket.
///
/// Generic over [`Check`] so probe types other than HTTP can plug in.
pub struct Server<C: Check> {
    socket_path: PathBuf,
    check: C,
}

impl<C: Check> Server<C> {
    pub fn new(socket_path: impl Into<PathBuf>, check: C) -> Self {
        Self {
            socket_path: socket_path.into(),
            check,
        }
    }

    /// Binds the socket and serves check requests until `shutdown` triggers.
    ///
    /// An accept failure is transient and logged unless shutdown was
    /// requested, in which case the loop ends cleanly. The socket file is
    /// removed again on every exit path once the bind succeeded.
    pub async fn run(&self, shutdown: Shutdown) -> Result<(), ServeError> {
        debug!("Opening socket {}", self.socket_path.display());
        let listener = UnixListener::bind(&self.socket_path).map_err(|error| ServeError::Bind {
            path: self.socket_path.clone(),
            error,
        })?;
        // Only after a successful bind is the path ours to clean up; a
        // refused second daemon must not unlink a live daemon's socket.
        let _guard = SocketGuard {
            path: self.socket_path.clone(),
        };

        info!(
            "Waiting for health check connections on {}",
            self.socket_path.display()
        );

        loop {
            // Shutdown is polled first so a signal beats a racing connection
            let stream = tokio::select! {
                biased;

                _ = shutdown.triggered() => {
                    info!("Received interrupt, exiting");
                    return Ok(());
                }
                result = listener.accept() => match result {
                    Ok((stream, _addr)) => stream,
                    Err(_) if shutdown.is_triggered() => {
                        info!("Received interrupt, exiting");
                        return Ok(());
                    }
                    Err(error) => {
                        warn!("Error accepting health check connection: {}", error);
                        continue;
                    }
                },
            };

            self.serve_connection(stream).await;
        }
    }

    /// Runs the check and answers one connection with a verdict byte.
    async fn serve_connection(&self, mut stream: UnixStream) {
        info!("Executing {} health check", self.check.name());
        let verdict = match self.check.run().await {
            Ok(()) => {
                info!("Health check succeeded");
                Verdict::Healthy
            }
            Err(error) => {
                error!("Health check failed: {}", error);
                Verdict::Unhealthy
            }
        };

        debug!("Writing {} verdict to check client", verdict);
        if let Err(error) = stream.write_all(&[verdict.as_byte()]).await {
            error!("Error writing response back to checker: {}", error);
            return;
        }
        if let Err(error) = stream.shutdown().await {
            debug!("Error closing connection: {}", error);
        }
    }
}

/// Removes the socket file when the serving scope ends.
///
/// Tokio's `UnixListener` does not unlink its path on drop, and a stale
/// file would make the next bind fail.
struct SocketGuard {
    path: PathBuf,
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_file(&self.path) {
            if error.kind() != io::ErrorKind::NotFound {
                warn!(
                    "Error removing socket {}: {}",
                    self.path.display(),
                    error
                );
            }
        }
    }
}
