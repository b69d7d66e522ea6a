//! # `stacks-api`
//!
//! Interfaces to the remote services the harness observes: the Stacks node's core API, the
//! indexer's extended API and its WebSocket transaction feed.
//!
//! Consumers program against the traits in [`traits`]. [`http::StacksApiClient`] implements every
//! request/response trait over HTTP and [`ws::WsTxStatusFeed`] implements the push feed.

pub mod config;
pub mod error;
pub mod http;
pub mod subscription;
pub mod traits;
pub mod types;
pub mod ws;

mod serde_utils;
