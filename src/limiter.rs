//! Bounded, order-preserving parallel execution.
//!
//! [`map_bounded`] runs one worker per input item with at most `limit`
//! workers in flight, and returns the results in input order no matter
//! how execution interleaves. Worker failures stay in their own slot; a
//! bad item never takes the batch down with it.

use std::future::Future;
use std::sync::Arc;

use futures::future;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Errors from limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterError {
    #[error("concurrency limit must be positive (got {0})")]
    InvalidLimit(usize),
}

/// Map `worker` over `items` with at most `limit` concurrent invocations.
///
/// Slot `i` of the output always holds item `i`'s result. As soon as one
/// worker finishes, success or failure alike, the next queued item starts.
/// The call returns only once every slot is populated. Dropping the
/// returned future drops all in-flight workers and releases their
/// permits, so a caller-side timeout can never leak concurrency.
///
/// `limit >= items.len()` degenerates to full parallelism; `limit == 0`
/// is rejected before any work starts.
pub async fn map_bounded<T, U, E, F, Fut>(
    items: Vec<T>,
    limit: usize,
    worker: F,
) -> Result<Vec<Result<U, E>>, LimiterError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<U, E>>,
{
    if limit == 0 {
        return Err(LimiterError::InvalidLimit(limit));
    }

    let semaphore = Arc::new(Semaphore::new(limit));
    let slots = items.into_iter().map(|item| {
        let semaphore = Arc::clone(&semaphore);
        let worker = &worker;
        async move {
            let _permit = semaphore.acquire().await.expect("limiter semaphore closed");
            worker(item).await
        }
    });

    Ok(future::join_all(slots).await)
}
