//! An in-memory transaction status feed.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use stacks_api::{
    error::ClientError,
    subscription::FeedHandle,
    traits::{TxStatusFeed, UpdateHandler},
    types::{TxId, TxRecord},
};

type SharedHandler = Arc<dyn Fn(TxRecord) + Send + Sync>;

#[derive(Default)]
struct FeedState {
    next_id: u64,
    handlers: BTreeMap<u64, (TxId, SharedHandler)>,
    scripts: HashMap<TxId, Vec<TxRecord>>,
    subscriptions: usize,
    unsubscriptions: usize,
    refuse: bool,
}

/// Status feed driven by the test.
///
/// Updates reach subscribers either through [`ScriptedFeed::push`], or by scripting them per
/// transaction with [`ScriptedFeed::script`], in which case each subscription replays them one
/// [`step`](ScriptedFeed::with_step) apart, starting one step after it was opened.
#[derive(Clone)]
pub struct ScriptedFeed {
    state: Arc<Mutex<FeedState>>,
    step: Duration,
}

impl Default for ScriptedFeed {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            step: Duration::from_millis(10),
        }
    }
}

impl std::fmt::Debug for ScriptedFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScriptedFeed")
            .field("step", &self.step)
            .field("active", &state.handlers.len())
            .field("subscriptions", &state.subscriptions)
            .field("unsubscriptions", &state.unsubscriptions)
            .finish()
    }
}

impl ScriptedFeed {
    /// Creates a feed with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay between scripted updates.
    pub const fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Scripts the updates every subscription to `tx_id` replays.
    pub fn script(&self, tx_id: TxId, records: impl IntoIterator<Item = TxRecord>) -> &Self {
        self.state
            .lock()
            .scripts
            .entry(tx_id)
            .or_default()
            .extend(records);
        self
    }

    /// Makes every further subscription attempt fail.
    pub fn refuse_subscriptions(&self) -> &Self {
        self.state.lock().refuse = true;
        self
    }

    /// Delivers `record` to every live subscription for its transaction, returning how many
    /// subscriptions received it.
    pub fn push(&self, record: TxRecord) -> usize {
        let handlers = self
            .state
            .lock()
            .handlers
            .values()
            .filter(|(tx_id, _)| *tx_id == record.tx_id)
            .map(|(_, handler)| handler.clone())
            .collect::<Vec<_>>();

        for handler in &handlers {
            handler(record.clone());
        }
        handlers.len()
    }

    /// Returns the number of subscriptions opened so far.
    pub fn subscriptions(&self) -> usize {
        self.state.lock().subscriptions
    }

    /// Returns the number of subscriptions released so far.
    pub fn unsubscriptions(&self) -> usize {
        self.state.lock().unsubscriptions
    }

    /// Returns the number of subscriptions currently open.
    pub fn active(&self) -> usize {
        self.state.lock().handlers.len()
    }
}

/// Delivers `record` to subscription `id` if it is still open.
fn deliver(state: &Mutex<FeedState>, id: u64, record: TxRecord) -> bool {
    let handler = state.lock().handlers.get(&id).map(|(_, h)| h.clone());
    match handler {
        Some(handler) => {
            handler(record);
            true
        }
        None => false,
    }
}

#[async_trait]
impl TxStatusFeed for ScriptedFeed {
    async fn subscribe(
        &self,
        tx_id: &TxId,
        handler: UpdateHandler,
    ) -> Result<FeedHandle, ClientError> {
        let (id, script) = {
            let mut state = self.state.lock();
            if state.refuse {
                return Err(ClientError::Status {
                    code: 503,
                    body: "subscriptions refused".to_string(),
                });
            }

            let id = state.next_id;
            state.next_id += 1;
            state.subscriptions += 1;
            state.handlers.insert(id, (*tx_id, Arc::from(handler)));
            (id, state.scripts.get(tx_id).cloned().unwrap_or_default())
        };

        if !script.is_empty() {
            let state = self.state.clone();
            let step = self.step;
            tokio::spawn(async move {
                for record in script {
                    tokio::time::sleep(step).await;
                    if !deliver(&state, id, record) {
                        break;
                    }
                }
            });
        }

        let state = self.state.clone();
        Ok(FeedHandle::new(*tx_id, move || {
            let mut state = state.lock();
            if state.handlers.remove(&id).is_some() {
                state.unsubscriptions += 1;
            }
        }))
    }
}
