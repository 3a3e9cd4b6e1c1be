//! Deadline wrapper for store calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use workpulse_domain::{Result, WorkPulseError};

/// Await `request`, failing with [`WorkPulseError::Timeout`] once `timeout`
/// elapses.
pub async fn with_store_timeout<T, F>(operation: &str, timeout: Duration, request: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if let Ok(result) = tokio::time::timeout(timeout, request).await {
        result
    } else {
        warn!(operation, ?timeout, "store request timed out");
        Err(WorkPulseError::Timeout(format!("{operation} exceeded {}ms", timeout.as_millis())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn maps_elapsed_deadline_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, WorkPulseError>(1)
        };
        let result = with_store_timeout("list_live_sessions", Duration::from_secs(10), slow).await;
        assert!(matches!(result, Err(WorkPulseError::Timeout(msg)) if msg.contains("list_live_sessions")));
    }

    #[tokio::test]
    async fn passes_through_results() {
        let ok = with_store_timeout("read", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: Result<()> = with_store_timeout("read", Duration::from_secs(1), async {
            Err(WorkPulseError::Database("locked".into()))
        })
        .await;
        assert_eq!(err, Err(WorkPulseError::Database("locked".into())));
    }
}
