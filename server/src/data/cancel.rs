//! Cooperative cancellation of store operations

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::error::DataError;

/// Run `fut` unless `cancel` fires first
///
/// When the token wins, the in-flight future is dropped (aborting the query and
/// rolling back any open transaction) and [`DataError::Cancelled`] is returned.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, DataError>
where
    F: Future<Output = Result<T, DataError>>,
{
    if cancel.is_cancelled() {
        return Err(DataError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("Store operation cancelled");
            Err(DataError::Cancelled)
        }
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_when_not_cancelled() {
        let token = CancellationToken::new();
        let res = cancellable(&token, async { Ok::<_, DataError>(3) }).await;
        assert_eq!(res.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_work() {
        let token = CancellationToken::new();
        token.cancel();
        let res = cancellable(&token, async {
            panic!("must not run");
            #[allow(unreachable_code)]
            Ok::<(), DataError>(())
        })
        .await;
        assert!(matches!(res, Err(DataError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let res = cancellable(&token, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<(), DataError>(())
        })
        .await;
        assert!(matches!(res, Err(DataError::Cancelled)));
    }
}
