//! Deadline racing.
//!
//! The guarded operation and a timer are raced; whichever settles first decides the outcome. When
//! the timer wins, the operation future is dropped right away. Dropping is how cancellation
//! reaches the operation: anything it acquired in a scoped way (feed handles, sockets) is released
//! by its `Drop` impl, exactly once, instead of being left to run in the background.

use std::{future::Future, pin::Pin, time::Duration};

use thiserror::Error;
use tracing::warn;

/// The deadline elapsed before the guarded operation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {after:?}")]
pub struct Elapsed {
    /// The deadline that was exceeded.
    pub after: Duration,
}

/// Races `fut` against a timer of length `after`.
pub async fn with_timeout<F>(after: Duration, fut: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    tokio::time::timeout(after, fut).await.map_err(|_| {
        warn!(?after, "deadline elapsed before operation settled");
        Elapsed { after }
    })
}

/// Wraps an async function so that every invocation is raced against a deadline of length `after`.
pub fn guard<A, T, Fut, F>(
    after: Duration,
    f: F,
) -> impl Fn(A) -> Pin<Box<dyn Future<Output = Result<T, Elapsed>> + Send>>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    move |arg| Box::pin(with_timeout(after, f(arg)))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    const DEADLINE: Duration = Duration::from_millis(1_000);

    struct Cleanup(Arc<AtomicUsize>);

    impl Drop for Cleanup {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn settle_after(delay: Duration, cleanups: Arc<AtomicUsize>) -> &'static str {
        let _cleanup = Cleanup(cleanups);
        tokio::time::sleep(delay).await;
        "settled"
    }

    #[tokio::test(start_paused = true)]
    async fn operation_settling_first_wins() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let result = with_timeout(
            DEADLINE,
            settle_after(DEADLINE - Duration::from_millis(1), cleanups.clone()),
        )
        .await;

        assert_eq!(result, Ok("settled"));
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_settling_first_wins_and_cleanup_runs_once() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let result = with_timeout(
            DEADLINE,
            settle_after(DEADLINE + Duration::from_millis(1), cleanups.clone()),
        )
        .await;

        assert_eq!(result, Err(Elapsed { after: DEADLINE }));
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);

        // Nothing keeps running after the race is lost.
        tokio::time::sleep(DEADLINE).await;
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn guarded_function_applies_deadline_per_call() {
        let guarded = guard(DEADLINE, |delay_ms: u64| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms
        });

        assert_eq!(guarded(10).await, Ok(10));
        assert!(guarded(5_000).await.is_err());
        assert_eq!(guarded(999).await, Ok(999));
    }
}
