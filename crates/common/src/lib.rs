//! Reusable pieces shared by every crate in the harness, such as initializing the tracing
//! framework.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
