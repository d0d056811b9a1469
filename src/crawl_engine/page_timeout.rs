//! Timeout wrapper for renderer operations
//!
//! A hung render must surface as a retryable failure, never as a stalled run.

use std::future::Future;
use std::time::Duration;

use super::crawl_types::FetchError;

/// Run `operation` with a hard timeout, mapping expiry to [`FetchError::Timeout`]
pub async fn with_operation_timeout<F, T>(operation: F, timeout: Duration) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    }
}
