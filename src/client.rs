//! Probe client, the cheap half of the split.
//!
//! Connects to a running daemon, reads the verdict byte, and reports the
//! outcome. A missing daemon or a malformed response is an error in its own
//! right, distinct from an unhealthy verdict.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tracing::debug;

use crate::protocol::{self, Verdict, WireError};

/// Error type for a failed probe.
#[derive(Debug)]
pub enum ProbeError {
    /// No daemon reachable on the socket path. Reported, never retried.
    Connect { path: PathBuf, error: io::Error },
    /// The connection dropped while reading the response.
    Read { error: io::Error },
    /// The daemon answered with something other than one verdict byte.
    Protocol { error: WireError },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Connect { path, error } => {
                write!(f, "error dialing socket '{}': {}", path.display(), error)
            }
            ProbeError::Read { error } => {
                write!(f, "error reading health check response: {}", error)
            }
            ProbeError::Protocol { error } => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Connect { error, .. } | ProbeError::Read { error } => Some(error),
            ProbeError::Protocol { error } => Some(error),
        }
    }
}

/// Connects to the daemon and reads its verdict.
pub async fn probe(socket_path: &Path) -> Result<Verdict, ProbeError> {
    debug!("Dialing socket unix://{}", socket_path.display());
    let mut stream =
        UnixStream::connect(socket_path)
            .await
            .map_err(|error| ProbeError::Connect {
                path: socket_path.to_path_buf(),
                error,
            })?;

    debug!("Reading health check response");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .map_err(|error| ProbeError::Read { error })?;

    debug!("Received response bytes: {:02x?}", response);
    protocol::decode_response(&response).map_err(|error| ProbeError::Protocol { error })
}
