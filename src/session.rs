use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::composer::{Composer, PendingSend};
use crate::config::ClientConfig;
use crate::directory::{ConversationDirectory, DirectoryView};
use crate::errors::{FetchError, SendError};
use crate::gateway::Gateway;
use crate::models::{ConversationKey, ConversationSummary, Message, MessageId, Thread};
use crate::selection::{SelectionController, SelectionState};
use crate::thread::{ThreadStore, ThreadView};

/// Outcome of an action that may have moved the selection: `None` when
/// nothing new became active, otherwise the result of the one load issued.
pub type SelectOutcome = Option<Result<Thread, FetchError>>;

/// The messaging screen's state, owned in one place.
///
/// Wires the directory, selection, thread store and composer together and
/// exposes read and subscribe accessors for the presentation layer. Each
/// store publishes snapshots through a `watch` channel.
pub struct MessagingSession<G> {
    directory: Arc<ConversationDirectory<G>>,
    threads: Arc<ThreadStore<G>>,
    composer: Composer<G>,
    selection: watch::Sender<SelectionController>,
}

impl<G: Gateway> MessagingSession<G> {
    pub fn new(gateway: Arc<G>, user_id: impl Into<String>, dedup_window: Duration) -> Self {
        let directory = Arc::new(ConversationDirectory::new(gateway.clone()));
        let threads = Arc::new(ThreadStore::new(gateway.clone(), dedup_window));
        let composer = Composer::new(gateway, threads.clone(), directory.clone(), user_id);
        let (selection, _) = watch::channel(SelectionController::new());
        Self { directory, threads, composer, selection }
    }

    pub fn from_config(gateway: Arc<G>, config: &ClientConfig) -> Self {
        Self::new(gateway, config.user_id.clone(), config.dedup_window)
    }

    // ── Read accessors ────────────────────────────────────────────────────────

    pub fn user_id(&self) -> &str {
        self.composer.user_id()
    }

    pub fn directory(&self) -> DirectoryView {
        self.directory.view()
    }

    pub fn active_key(&self) -> Option<ConversationKey> {
        self.selection.borrow().active_key().cloned()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.borrow().state()
    }

    /// Summary of the active conversation, when the directory knows it.
    pub fn active_summary(&self) -> Option<ConversationSummary> {
        let key = self.active_key()?;
        self.directory.view().find(&key).cloned()
    }

    pub fn thread(&self) -> ThreadView {
        self.threads.view()
    }

    pub fn subscribe_directory(&self) -> watch::Receiver<DirectoryView> {
        self.directory.subscribe()
    }

    pub fn subscribe_thread(&self) -> watch::Receiver<ThreadView> {
        self.threads.subscribe()
    }

    pub fn subscribe_selection(&self) -> watch::Receiver<SelectionController> {
        self.selection.subscribe()
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    /// Refreshes the directory. A navigation hint still waiting on the
    /// first directory load is resolved afterwards.
    pub async fn refresh(&self) -> Result<Vec<ConversationSummary>, FetchError> {
        let summaries = self.directory.refresh().await?;
        let hint_pending = self.selection.borrow().pending_hint().is_some();
        if hint_pending {
            self.settle().await;
        }
        Ok(summaries)
    }

    /// Applies route identifiers. `None` clears them without changing the
    /// active conversation.
    pub fn open_route(
        &self,
        route: Option<ConversationKey>,
    ) -> impl Future<Output = SelectOutcome> + Send + '_ {
        self.selection.send_modify(|sel| sel.set_route(route));
        self.settle()
    }

    /// One-shot hint naming only the counterpart, e.g. "message the seller".
    pub fn navigate_with_hint(
        &self,
        counterpart_id: &str,
    ) -> impl Future<Output = SelectOutcome> + Send + '_ {
        self.selection.send_modify(|sel| sel.set_hint(counterpart_id));
        self.settle()
    }

    /// A click on a directory entry. Clicking navigates away from any
    /// route-addressed conversation, so the route is cleared first.
    ///
    /// The load is issued before this returns, so of two selects made in a
    /// row the second always wins regardless of which response lands last.
    pub fn select(&self, key: ConversationKey) -> impl Future<Output = SelectOutcome> + Send + '_ {
        self.selection.send_modify(|sel| {
            sel.set_route(None);
            sel.click(key);
        });
        self.settle()
    }

    /// Loads the active conversation again, e.g. after a failed load.
    pub fn reload(&self) -> impl Future<Output = SelectOutcome> + Send + '_ {
        let load = self.active_key().map(|key| self.threads.load(key));
        async move {
            match load {
                Some(load) => Some(load.await),
                None => None,
            }
        }
    }

    /// Optimistically appends `text` to the active thread and sends it in
    /// the background. Blank text or no active conversation is a no-op.
    pub fn send(&self, text: &str) -> Option<JoinHandle<Result<(), SendError>>> {
        self.composer.send(self.active_key().as_ref(), text)
    }

    /// Like [`send`](Self::send), leaving the network half to the caller.
    pub fn compose(&self, text: &str) -> Result<PendingSend<G>, SendError> {
        self.composer.compose(self.active_key().as_ref(), text)
    }

    pub fn retry(&self, id: &MessageId) -> Result<JoinHandle<Result<(), SendError>>, SendError> {
        let pending = self.composer.retry(id)?;
        Ok(tokio::spawn(pending.submit()))
    }

    pub fn discard(&self, id: &MessageId) -> Result<Message, SendError> {
        self.composer.discard(id)
    }

    /// Resolves the selection now and issues at most one load for it.
    fn settle(&self) -> impl Future<Output = SelectOutcome> + Send + '_ {
        let directory = self.directory.view();
        let mut next = None;
        self.selection.send_if_modified(|sel| {
            let before = sel.state();
            next = sel.resolve(&directory);
            next.is_some() || sel.state() != before
        });
        let load = next.map(|key| {
            debug!("Selection moved to {key}; loading");
            self.threads.load(key)
        });
        async move {
            match load {
                Some(load) => Some(load.await),
                None => None,
            }
        }
    }
}
