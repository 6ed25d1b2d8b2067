//! Transport timeout applied to every remote call.

use std::future::Future;
use std::time::Duration;

use crate::error::RemoteError;

/// Run `fut` with an upper bound of `limit`.
///
/// Expiry becomes [`RemoteError::Timeout`], an ordinary transport failure;
/// the abandoned future is dropped.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout {
            millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn slow_call_times_out() {
        let result: Result<(), RemoteError> = bounded(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RemoteError::Timeout { millis: 50 })));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let result = bounded(Duration::from_secs(1), async { Ok::<_, RemoteError>(7) }).await;
        assert_eq!(result.expect("value"), 7);
    }

    #[tokio::test]
    async fn inner_error_is_preserved() {
        let result: Result<(), RemoteError> = bounded(Duration::from_secs(1), async {
            Err(RemoteError::Rejected("nope".into()))
        })
        .await;
        assert!(matches!(result, Err(RemoteError::Rejected(_))));
    }
}
