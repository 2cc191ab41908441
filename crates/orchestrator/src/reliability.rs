//! Timeout boundary around Reasoning Oracle calls

use common::OperationTimer;
use domain::OracleError;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Run one oracle call, mapping an elapsed deadline to [`OracleError::Timeout`]
pub async fn with_oracle_timeout<T, Fut>(
    operation: &str,
    limit: Duration,
    call: Fut,
) -> Result<T, OracleError>
where
    Fut: Future<Output = Result<T, OracleError>>,
{
    let timer = OperationTimer::new(operation);
    let result = match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Oracle call timed out"
            );
            Err(OracleError::Timeout(limit))
        }
    };
    timer.finish_with_result(&result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result: Result<(), OracleError> =
            with_oracle_timeout("interpret", Duration::from_secs(30), async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(OracleError::Timeout(Duration::from_secs(30))));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result = with_oracle_timeout("interpret", Duration::from_secs(1), async {
            Err::<(), _>(OracleError::Malformed("x".into()))
        })
        .await;
        assert_eq!(result, Err(OracleError::Malformed("x".into())));
    }
}
