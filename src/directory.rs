use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::FetchError;
use crate::gateway::Gateway;
use crate::models::{ConversationKey, ConversationSummary};

/// Snapshot of the conversation list as the presentation layer sees it.
#[derive(Debug, Clone, Default)]
pub struct DirectoryView {
    summaries: Vec<ConversationSummary>,
    loaded: bool,
    error: Option<FetchError>,
    /// Issue number of the refresh whose result is on display.
    generation: u64,
}

impl DirectoryView {
    /// Newest conversation first, one entry per key.
    pub fn summaries(&self) -> &[ConversationSummary] {
        &self.summaries
    }

    /// Whether any refresh has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Error from the latest refresh, if it failed. The list above still
    /// holds the last good result.
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn find(&self, key: &ConversationKey) -> Option<&ConversationSummary> {
        self.summaries.iter().find(|s| &s.key() == key)
    }

    pub fn with_counterpart<'a>(
        &'a self,
        counterpart_id: &'a str,
    ) -> impl Iterator<Item = &'a ConversationSummary> + 'a {
        self.summaries.iter().filter(move |s| s.other_user.id == counterpart_id)
    }

    /// Entries whose counterpart name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&ConversationSummary> {
        let needle = query.trim().to_lowercase();
        self.summaries
            .iter()
            .filter(|s| needle.is_empty() || s.other_user.name.to_lowercase().contains(&needle))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn from_summaries(summaries: Vec<ConversationSummary>) -> Self {
        Self { summaries: normalize(summaries), loaded: true, error: None, generation: 1 }
    }
}

/// Sorts newest first and keeps only the newest summary per key.
fn normalize(mut summaries: Vec<ConversationSummary>) -> Vec<ConversationSummary> {
    summaries.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
    let mut seen = HashSet::new();
    summaries.retain(|s| seen.insert(s.key()));
    summaries
}

/// Cached list of conversation summaries, replaced wholesale on refresh.
pub struct ConversationDirectory<G> {
    gateway: Arc<G>,
    issued: AtomicU64,
    view: watch::Sender<DirectoryView>,
}

impl<G: Gateway> ConversationDirectory<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        let (view, _) = watch::channel(DirectoryView::default());
        Self { gateway, issued: AtomicU64::new(0), view }
    }

    pub fn view(&self) -> DirectoryView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DirectoryView> {
        self.view.subscribe()
    }

    /// Fetches the list and swaps it in.
    ///
    /// The refresh is numbered when called, not when polled. A result is
    /// applied only if no later-issued refresh has already been applied, so
    /// overlapping refreshes never regress the list. On failure the cached
    /// list is left untouched.
    pub fn refresh(
        &self,
    ) -> impl Future<Output = Result<Vec<ConversationSummary>, FetchError>> + Send + '_ {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            match self.gateway.list_conversations().await {
                Ok(fetched) => {
                    let summaries = normalize(fetched);
                    let applied = self.view.send_if_modified(|view| {
                        if ticket <= view.generation {
                            return false;
                        }
                        view.summaries = summaries.clone();
                        view.generation = ticket;
                        view.loaded = true;
                        view.error = None;
                        true
                    });
                    if applied {
                        info!("Directory refreshed: {} conversations", summaries.len());
                    } else {
                        debug!("Discarding directory refresh #{ticket}; a newer one is on display");
                    }
                    Ok(summaries)
                }
                Err(e) => {
                    warn!("Directory refresh #{ticket} failed: {e}");
                    self.view.send_if_modified(|view| {
                        if ticket <= view.generation {
                            return false;
                        }
                        view.error = Some(e.clone());
                        true
                    });
                    Err(e)
                }
            }
        }
    }
}
