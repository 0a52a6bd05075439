//! Deadline for a single store or hasher call.
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Run `fut`, failing with `AppError::Timeout(op)` once `limit` has passed
pub async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(op, limit_ms = limit.as_millis() as u64, "operation timed out");
            Err(AppError::Timeout(op))
        },
    }
}
