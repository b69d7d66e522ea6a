//! Test utilities for the harness crates.
//!
//! [`node::MockStacksNode`] stands in for the node and the indexer's HTTP API and
//! [`feed::ScriptedFeed`] for the WebSocket status feed. Both are cheap to clone; clones share
//! state so a test can keep one to inspect call counters after handing the other to the code
//! under test.

pub mod feed;
pub mod fixtures;
pub mod node;
pub mod prelude;
