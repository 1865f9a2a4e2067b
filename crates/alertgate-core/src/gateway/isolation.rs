//! Fault isolation around the Alertmanager API binding
//!
//! A panic raised while a relay call is being polled is caught here, logged
//! and returned as [`Error::FaultIsolated`]. It never reaches the caller.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use crate::error::{Error, Result};

/// Drive `fut` to completion, converting a panic into an error.
pub async fn guard<T, F>(operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(&*payload);
            error!(operation, error = %message, "Panic while calling remote Alertmanager");
            Err(Error::FaultIsolated {
                operation: operation.to_string(),
                message,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explode(message: &str) -> Result<()> {
        panic!("{}", message)
    }

    #[tokio::test]
    async fn test_passes_results_through() {
        let ok = guard("reading", async { Ok::<_, Error>(5) }).await.unwrap();
        assert_eq!(ok, 5);

        let err = guard("reading", async { Err::<(), _>(Error::not_ready("x")) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotReady(_)));
    }

    #[tokio::test]
    async fn test_converts_str_panic() {
        let err = guard("getting silence", async { explode("nil pointer in decoder") })
            .await
            .unwrap_err();

        match err {
            Error::FaultIsolated { operation, message } => {
                assert_eq!(operation, "getting silence");
                assert_eq!(message, "nil pointer in decoder");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_converts_formatted_panic_after_await() {
        let err = guard("listing silences", async {
            tokio::task::yield_now().await;
            let index = 3;
            explode(&format!("index {index} out of range"))
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::FaultIsolated { ref message, .. } if message == "index 3 out of range"
        ));
    }
}
