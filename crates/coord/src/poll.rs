//! Fixed-interval polling until a predicate holds.

use std::{future::Future, time::Duration};

use thiserror::Error;
use tracing::trace;

/// Error returned by [`wait_until_bounded`].
#[derive(Debug, Error)]
pub enum PollError<E> {
    /// The predicate was still unsatisfied after the allotted number of probes.
    #[error("predicate unsatisfied after {polls} polls")]
    Exhausted {
        /// Number of probes that were made.
        polls: usize,
    },

    /// A probe failed.
    #[error("probe failed: {0}")]
    Fetch(E),
}

/// Sleeps `interval`, calls `fetch`, and checks `predicate`, looping until it holds. Returns the
/// satisfying value.
///
/// There is no upper bound on the number of probes. Wrap the call in
/// [`with_timeout`](crate::timeout::with_timeout) to bound it in time, or use
/// [`wait_until_bounded`] to bound it in probes. Errors from `fetch` end the wait immediately; make
/// `fetch` resilient with [`retry_with`](crate::retry::retry_with) if that is not desired.
pub async fn wait_until<T, E, Fut, Fetch, P>(
    mut fetch: Fetch,
    predicate: P,
    interval: Duration,
) -> Result<T, E>
where
    Fetch: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let mut polls = 0usize;
    loop {
        tokio::time::sleep(interval).await;
        let value = fetch().await?;
        polls += 1;
        if predicate(&value) {
            trace!(polls, "predicate satisfied");
            return Ok(value);
        }
    }
}

/// Like [`wait_until`] but gives up after `max_polls` unsatisfied probes.
pub async fn wait_until_bounded<T, E, Fut, Fetch, P>(
    mut fetch: Fetch,
    predicate: P,
    interval: Duration,
    max_polls: usize,
) -> Result<T, PollError<E>>
where
    Fetch: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    for polls in 1..=max_polls {
        tokio::time::sleep(interval).await;
        let value = fetch().await.map_err(PollError::Fetch)?;
        if predicate(&value) {
            trace!(polls, "predicate satisfied");
            return Ok(value);
        }
    }

    Err(PollError::Exhausted { polls: max_polls })
}
