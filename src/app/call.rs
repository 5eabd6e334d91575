//! Deadline wrapper for collaborator calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{ExecutionError, Result};

/// Await `fut`, failing with [`ExecutionError::Timeout`] once `limit` passes.
pub async fn with_timeout<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ExecutionError::Timeout {
            operation,
            secs: limit.as_secs(),
        }
        .into()),
    }
}
