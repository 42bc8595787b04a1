//! Deadline helpers shared by the server and client.

use crate::error::{ProtocolError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Default deadline for connecting and for writing one frame
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A session with no complete inbound frame for this long is closed
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// How long shutdown waits for active sessions to finish
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `fut` with a deadline, mapping expiry to [`ProtocolError::Timeout`].
pub async fn with_timeout_error<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}
