//! Wire protocol between the daemon and the probe client.
//!
//! A check request carries no payload: the client connects, the daemon
//! answers with exactly one verdict byte and closes the connection. Anything
//! other than a single byte on the wire is a protocol violation, which the
//! client reports separately from an unhealthy verdict.

use std::fmt;

/// Verdict byte written for a passing check.
pub const HEALTHY: u8 = 0;

/// Verdict byte written for a failing check.
pub const UNHEALTHY: u8 = 1;

/// Outcome of one health check as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    Unhealthy,
}

impl Verdict {
    /// Maps a verdict byte read off the wire.
    ///
    /// Any non-zero byte counts as unhealthy; this daemon only ever writes
    /// [`UNHEALTHY`].
    pub fn from_byte(byte: u8) -> Self {
        if byte == HEALTHY {
            Verdict::Healthy
        } else {
            Verdict::Unhealthy
        }
    }

    /// The byte written on the wire for this verdict.
    pub fn as_byte(&self) -> u8 {
        match self {
            Verdict::Healthy => HEALTHY,
            Verdict::Unhealthy => UNHEALTHY,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Verdict::Healthy)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Healthy => write!(f, "healthy"),
            Verdict::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Error type for a response that was not exactly one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    /// The bytes actually received.
    pub bytes: Vec<u8>,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected health check response ({} bytes): {:02x?}",
            self.bytes.len(),
            self.bytes
        )
    }
}

impl std::error::Error for WireError {}

/// Decodes a complete daemon response into a verdict.
///
/// The response must be exactly one byte. Zero bytes (the connection closed
/// without an answer) and trailing data both violate the protocol.
pub fn decode_response(bytes: &[u8]) -> Result<Verdict, WireError> {
    match bytes {
        [byte] => Ok(Verdict::from_byte(*byte)),
        _ => Err(WireError {
            bytes: bytes.to_vec(),
        }),
    }
}
