use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::FetchError;
use crate::gateway::Gateway;
use crate::models::{ConversationKey, CounterpartProfile, DeliveryState, Message, MessageId, Thread};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ThreadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(FetchError),
}

/// What the presentation layer sees of the active thread.
///
/// Fetched messages and locally composed ones are held apart. Local ones
/// live in a per-conversation outbox so they survive switching away and
/// back, and are merged in by [`ThreadView::messages`].
#[derive(Debug, Clone, Default)]
pub struct ThreadView {
    key: Option<ConversationKey>,
    epoch: u64,
    status: ThreadStatus,
    counterpart: Option<CounterpartProfile>,
    loaded: Vec<Message>,
    outbox: HashMap<ConversationKey, Vec<Message>>,
}

impl ThreadView {
    pub fn key(&self) -> Option<&ConversationKey> {
        self.key.as_ref()
    }

    /// Epoch of the most recently issued load.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn status(&self) -> &ThreadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == ThreadStatus::Loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            ThreadStatus::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn counterpart(&self) -> Option<&CounterpartProfile> {
        self.counterpart.as_ref()
    }

    /// Fetched messages overlaid with local ones, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        let Some(key) = &self.key else {
            return Vec::new();
        };
        let mut merged = self.loaded.clone();
        if let Some(local) = self.outbox.get(key) {
            merged.extend(local.iter().cloned());
        }
        // Stable, so fetched messages stay ahead of local ones on ties.
        merged.sort_by_key(|m| m.timestamp);
        merged
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.loaded
            .iter()
            .chain(self.outbox.values().flatten())
            .find(|m| &m.id == id)
    }

    fn local_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.outbox.values_mut().flatten().find(|m| &m.id == id)
    }
}

/// Holds the message list for the active conversation.
///
/// Every [`load`](ThreadStore::load) takes a fresh epoch at call time, and
/// a completed load only touches the view if its epoch is still current.
/// Superseded requests run to completion; their results are dropped.
pub struct ThreadStore<G> {
    gateway: Arc<G>,
    dedup_window: Duration,
    view: watch::Sender<ThreadView>,
}

impl<G: Gateway> ThreadStore<G> {
    pub fn new(gateway: Arc<G>, dedup_window: Duration) -> Self {
        let (view, _) = watch::channel(ThreadView::default());
        Self { gateway, dedup_window, view }
    }

    pub fn view(&self) -> ThreadView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThreadView> {
        self.view.subscribe()
    }

    pub fn load(
        &self,
        key: ConversationKey,
    ) -> impl Future<Output = Result<Thread, FetchError>> + Send + '_ {
        let epoch = self.begin(&key);
        async move {
            let result = self.gateway.fetch_thread(&key).await;
            self.finish(epoch, &key, &result);
            result
        }
    }

    fn begin(&self, key: &ConversationKey) -> u64 {
        let mut epoch = 0;
        self.view.send_modify(|view| {
            view.epoch += 1;
            epoch = view.epoch;
            if view.key.as_ref() != Some(key) {
                view.key = Some(key.clone());
                view.loaded.clear();
                view.counterpart = None;
            }
            view.status = ThreadStatus::Loading;
        });
        debug!("Loading thread {key} (epoch {epoch})");
        epoch
    }

    fn finish(&self, epoch: u64, key: &ConversationKey, result: &Result<Thread, FetchError>) {
        let window = self.dedup_window;
        let applied = self.view.send_if_modified(|view| {
            if view.epoch != epoch {
                return false;
            }
            match result {
                Ok(thread) => {
                    let mut loaded = thread.messages.clone();
                    loaded.sort_by_key(|m| m.timestamp);
                    if let Some(local) = view.outbox.get_mut(key) {
                        prune_echoes(local, &loaded, window);
                    }
                    view.loaded = loaded;
                    view.counterpart = thread.counterpart.clone();
                    view.status = ThreadStatus::Ready;
                }
                Err(e) => view.status = ThreadStatus::Failed(e.clone()),
            }
            true
        });

        match (applied, result) {
            (false, _) => debug!("Discarding stale thread result for {key} (epoch {epoch})"),
            (true, Ok(thread)) => {
                info!("Thread {key} loaded: {} messages", thread.messages.len())
            }
            (true, Err(e)) => warn!("Thread {key} failed to load: {e}"),
        }
    }

    /// Adds a locally composed message to `key`'s outbox.
    pub fn append_local(&self, key: &ConversationKey, message: Message) {
        self.view.send_modify(|view| {
            view.outbox.entry(key.clone()).or_default().push(message);
        });
    }

    /// Moves a pending local message to `state`. Messages that are already
    /// settled, or no longer held, are left alone.
    pub fn settle(&self, id: &MessageId, state: DeliveryState) -> bool {
        self.view.send_if_modified(|view| match view.local_mut(id) {
            Some(m) if m.delivery == DeliveryState::Pending => {
                m.delivery = state;
                true
            }
            _ => false,
        })
    }

    /// Removes and returns a local message, but only if its send failed.
    pub fn take_failed(&self, id: &MessageId) -> Option<Message> {
        let mut taken = None;
        self.view.send_if_modified(|view| {
            for local in view.outbox.values_mut() {
                if let Some(pos) = local
                    .iter()
                    .position(|m| &m.id == id && m.delivery == DeliveryState::Failed)
                {
                    taken = Some(local.remove(pos));
                    return true;
                }
            }
            false
        });
        taken
    }
}

/// Drops local messages the backend has echoed back.
///
/// Each fetched message accounts for at most one local copy, the closest
/// in time. Failed sends stay until the user retries or discards them.
fn prune_echoes(local: &mut Vec<Message>, fetched: &[Message], window: Duration) {
    for echo in fetched {
        let closest = local
            .iter()
            .enumerate()
            .filter(|(_, m)| m.delivery != DeliveryState::Failed && echo.is_duplicate_of(m, window))
            .min_by_key(|(_, m)| (echo.timestamp - m.timestamp).num_milliseconds().abs())
            .map(|(pos, _)| pos);
        if let Some(pos) = closest {
            local.remove(pos);
        }
    }
}
