//! Settle-once waiters.
//!
//! [`waiter`] returns a producing half ([`Finisher`]) and a consuming half ([`Waiter`]). The first
//! call to [`Finisher::finish`] settles the waiter. Every later call is rejected with
//! [`WaiterError::AlreadySettled`] and its value is dropped, so racing producers can never
//! overwrite or double-deliver a result.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors reported by either half of a waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaiterError {
    /// `finish` was called after the waiter had already been settled.
    #[error("waiter already settled")]
    AlreadySettled,

    /// Every [`Finisher`] was dropped without settling the waiter.
    #[error("waiter abandoned before being settled")]
    Abandoned,

    /// The [`Waiter`] was dropped before it could be settled.
    #[error("waiter dropped before being settled")]
    WaiterDropped,
}

/// Creates a new settle-once waiter.
pub fn waiter<T>() -> (Finisher<T>, Waiter<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        Finisher {
            slot: Arc::new(Mutex::new(Some(sender))),
        },
        Waiter { receiver },
    )
}

/// Producing half of a waiter. Cheap to clone; all clones share the same settle-once slot.
pub struct Finisher<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Finisher<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for Finisher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finisher")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T> Finisher<T> {
    /// Settles the waiter with `value`. Only the first call across all clones succeeds.
    pub fn finish(&self, value: T) -> Result<(), WaiterError> {
        let sender = self
            .slot
            .lock()
            .take()
            .ok_or(WaiterError::AlreadySettled)?;

        sender.send(value).map_err(|_| WaiterError::WaiterDropped)
    }

    /// Returns true once any clone has called [`Finisher::finish`].
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

/// Consuming half of a waiter. Resolves once the waiter is settled.
pub struct Waiter<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> std::fmt::Debug for Waiter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter").finish_non_exhaustive()
    }
}

impl<T> Future for Waiter<T> {
    type Output = Result<T, WaiterError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|res| res.map_err(|_| WaiterError::Abandoned))
    }
}
