//! # `coord`
//!
//! Asynchronous coordination primitives used to wait on remote chain state: retries that tell
//! transient failures apart from counted ones, deadline racing, fixed-interval polling and
//! settle-once waiters.

pub mod chunk;
pub mod poll;
pub mod predicate;
pub mod retry;
pub mod timeout;
pub mod waiter;
