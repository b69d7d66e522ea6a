//! Retry mechanism with an explicit error classifier.
//!
//! Every failure is classified as either *transient* or *counted*. Transient failures (a flaky
//! gateway in front of the remote node, for instance) are retried without consuming the attempt
//! budget and are therefore retried indefinitely. Counted failures consume one unit of the budget;
//! once the budget is spent the most recent error is returned to the caller.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use tracing::{debug, warn};

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ErrorClass {
    /// Whether the failure is assumed to heal by itself.
    pub transient: bool,
}

impl ErrorClass {
    /// Retried without consuming the attempt budget.
    pub const TRANSIENT: ErrorClass = ErrorClass { transient: true };

    /// Consumes one unit of the attempt budget.
    pub const COUNTED: ErrorClass = ErrorClass { transient: false };
}

/// Errors that know how to classify themselves for the purposes of retrying.
pub trait Classify {
    /// Returns the [`ErrorClass`] of this error.
    fn classify(&self) -> ErrorClass;
}

/// Type alias for the classifier function to reduce type complexity.
pub type Classifier<E> = Arc<dyn Fn(&E) -> ErrorClass + Send + Sync>;

/// A retry strategy: how errors are classified, how many counted failures are tolerated, and how
/// long to wait between attempts.
pub struct Strategy<E> {
    classifier: Classifier<E>,

    /// Number of counted failures tolerated before the error is surfaced.
    max_attempts: usize,

    /// Delay between attempts. Zero retries immediately.
    delay: Duration,
}

// Manual impl: a derive would require `E: Clone`.
impl<E> Clone for Strategy<E> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            max_attempts: self.max_attempts,
            delay: self.delay,
        }
    }
}

impl<E> std::fmt::Debug for Strategy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<E: 'static> Strategy<E> {
    /// Creates a new strategy with the given budget and classifier.
    pub fn new<F>(max_attempts: usize, classifier: F) -> Self
    where
        F: Fn(&E) -> ErrorClass + Send + Sync + 'static,
    {
        Self {
            classifier: Arc::new(classifier),
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    /// Creates a strategy where every failure is counted.
    pub fn counted(max_attempts: usize) -> Self {
        Self::new(max_attempts, |_| ErrorClass::COUNTED)
    }

    /// Creates a strategy that defers classification to the error type itself.
    pub fn classified(max_attempts: usize) -> Self
    where
        E: Classify,
    {
        Self::new(max_attempts, E::classify)
    }

    /// Sets the delay between attempts.
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the counted-failure budget.
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Returns the delay between attempts.
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        // Keeps an endless run of transient failures from starving the runtime.
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

/// Returns a reusable combinator that applies `strategy` to any future-generating function.
pub fn retry<A, E, Fut, Gen>(
    strategy: Strategy<E>,
) -> impl Fn(Gen) -> Pin<Box<dyn Future<Output = Result<A, E>> + Send>>
where
    A: Send + 'static,
    E: std::fmt::Debug + Send + 'static,
    Fut: Future<Output = Result<A, E>> + Send + 'static,
    Gen: FnMut() -> Fut + Send + 'static,
{
    move |generator: Gen| {
        let strategy = strategy.clone();
        Box::pin(retry_with(strategy, generator))
    }
}

/// Runs `generator` until it succeeds, a counted failure exhausts the budget, or forever if it
/// only ever fails transiently.
pub async fn retry_with<A, E, Fut, Gen>(strategy: Strategy<E>, mut generator: Gen) -> Result<A, E>
where
    E: std::fmt::Debug,
    Fut: Future<Output = Result<A, E>>,
    Gen: FnMut() -> Fut,
{
    let mut attempts = 0;

    loop {
        match generator().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if (strategy.classifier)(&error).transient {
                    debug!(?error, attempts, "transient failure, retrying without charge");
                    pause(strategy.delay).await;
                    continue;
                }

                if attempts >= strategy.max_attempts {
                    warn!(?error, attempts, "retry budget exhausted");
                    return Err(error);
                }

                attempts += 1;
                debug!(?error, attempts, max_attempts = strategy.max_attempts, "retrying");
                pause(strategy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    enum TestError {
        BadGateway,
        Fatal,
    }

    impl Classify for TestError {
        fn classify(&self) -> ErrorClass {
            match self {
                TestError::BadGateway => ErrorClass::TRANSIENT,
                TestError::Fatal => ErrorClass::COUNTED,
            }
        }
    }

    #[tokio::test]
    async fn counted_failures_exhaust_budget() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result: Result<(), TestError> = retry_with(Strategy::classified(2), move || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            }
        })
        .await;

        assert_eq!(result, Err(TestError::Fatal));
        // Initial attempt + 2 retries.
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_failures_never_consume_budget() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = retry_with(Strategy::classified(2), move || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 100 {
                    Err(TestError::BadGateway)
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("recovered"));
        assert_eq!(counter.load(Ordering::SeqCst), 101);
    }

    #[tokio::test]
    async fn transient_failures_do_not_reset_counted_ones() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        // fatal, gateway, fatal, gateway, fatal: three counted failures against a budget of two.
        let result: Result<(), TestError> = retry_with(Strategy::classified(2), move || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count % 2 == 0 {
                    Err(TestError::Fatal)
                } else {
                    Err(TestError::BadGateway)
                }
            }
        })
        .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn zero_budget_surfaces_first_counted_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result: Result<(), TestError> = retry_with(Strategy::counted(0), move || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::BadGateway)
            }
        })
        .await;

        // `counted` ignores the error's own classification.
        assert_eq!(result, Err(TestError::BadGateway));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied_between_attempts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        const DELAY: Duration = Duration::from_millis(250);

        let start = tokio::time::Instant::now();
        let result = retry_with(
            Strategy::classified(3).with_delay(DELAY),
            move || {
                let counter = counter_clone.clone();
                async move {
                    let count = counter.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(TestError::Fatal)
                    } else {
                        Ok(count)
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Ok(2));
        assert!(start.elapsed() >= DELAY * 2);
    }

    #[tokio::test]
    async fn combinator_is_reusable() {
        let counter = Arc::new(AtomicUsize::new(0));
        let with_retry = retry(Strategy::classified(1));

        for _ in 0..2 {
            let counter = counter.clone();
            let result = with_retry(move || {
                let counter = counter.clone();
                async move {
                    let count = counter.fetch_add(1, Ordering::SeqCst);
                    if count % 2 == 0 {
                        Err(TestError::Fatal)
                    } else {
                        Ok(count)
                    }
                }
            })
            .await;
            assert!(result.is_ok());
        }

        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }
}
