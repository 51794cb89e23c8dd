//! Cancellation checks performed before every blocking round trip.
//!
//! A token observed as cancelled short-circuits the call before the live
//! system or the store is contacted. Round trips already in flight run to
//! completion.

pub use tokio_util::sync::CancellationToken;

use tracing::debug;

use crate::error::{Result, SkError};

/// Returns `Cancelled` if the token has fired.
pub fn ensure_active(token: &CancellationToken, operation: &'static str) -> Result<()> {
    if token.is_cancelled() {
        debug!(operation, "Cancelled before round trip");
        return Err(SkError::Cancelled { operation });
    }
    Ok(())
}
