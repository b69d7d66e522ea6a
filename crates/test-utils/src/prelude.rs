//! Re-exports of the commonly used test utilities.

pub use crate::{
    feed::ScriptedFeed,
    fixtures::{account, confirmed, pending, pox_info, signed_tx, tx_id},
    node::{Failure, MockStacksNode},
};
