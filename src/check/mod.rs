//! Pluggable health checks.
//!
//! The daemon is generic over the [`Check`] trait: a check either completes,
//! which counts as healthy, or fails with an error, which counts as
//! unhealthy. The daemon never inspects why a check failed; the error is
//! only logged. Because requests are served one at a time, a check must
//! terminate on its own (the HTTP check bounds itself with its request
//! timeout).

pub mod http;

use async_trait::async_trait;

pub use http::HttpCheck;

/// Boxed error returned by a failed check. The daemon only logs it; probe
/// types keep their own concrete error types behind this.
pub type CheckError = Box<dyn std::error::Error + Send + Sync>;

/// A runnable health check.
#[async_trait]
pub trait Check: Send + Sync {
    /// Runs the check once. `Ok(())` reports healthy, any error unhealthy.
    async fn run(&self) -> Result<(), CheckError>;

    /// Returns the name of this check for logging purposes.
    fn name(&self) -> &'static str;
}
