//! Caller-supplied cancellation for gateway operations
//!
//! Every gateway operation takes a [`CancellationToken`]. When the token fires
//! before the operation completes, the operation is dropped and
//! [`Error::Cancelled`] is returned.

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

pub use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Run `fut` until it completes or `token` is cancelled.
pub async fn run_until_cancelled<T, F>(
    token: &CancellationToken,
    operation: &str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::cancelled(operation)),
        result = fut => result,
    }
}

/// Fail fast if `token` has already been cancelled.
pub fn ensure_active(token: &CancellationToken, operation: &str) -> Result<()> {
    if token.is_cancelled() {
        Err(Error::cancelled(operation))
    } else {
        Ok(())
    }
}

/// Token derived by [`deadline`].
///
/// The token is cancelled when this value is dropped, which also ends the
/// timer task behind it.
#[derive(Debug)]
pub struct Deadline {
    token: CancellationToken,
}

impl Deadline {
    /// The derived token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Deref for Deadline {
    type Target = CancellationToken;

    fn deref(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Derive a token that is cancelled when `parent` is, after `timeout`, or
/// when the returned [`Deadline`] is dropped.
///
/// Must be called from within a tokio runtime.
pub fn deadline(parent: &CancellationToken, timeout: Duration) -> Deadline {
    let token = parent.child_token();
    let timer_token = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = timer_token.cancelled() => {}
            _ = tokio::time::sleep(timeout) => timer_token.cancel(),
        }
    });

    Deadline { token }
}
