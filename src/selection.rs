use tracing::{debug, info};

use crate::directory::DirectoryView;
use crate::models::ConversationKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    Unselected,
    /// Inputs changed and have not settled yet.
    Resolving,
    Active(ConversationKey),
}

/// Decides which conversation is active from three competing inputs.
///
/// Precedence, highest first:
/// 1. a route carrying both listing and counterpart ids,
/// 2. a one-shot navigation hint naming only the counterpart,
/// 3. a click on a directory entry.
///
/// The controller is synchronous and owns no I/O: [`resolve`] reports the
/// key that must be loaded, and only when the active key actually changes.
///
/// [`resolve`]: SelectionController::resolve
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    active: Option<ConversationKey>,
    resolving: bool,
    route: Option<ConversationKey>,
    hint: Option<String>,
    click: Option<ConversationKey>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match (&self.active, self.resolving) {
            (_, true) => SelectionState::Resolving,
            (Some(key), false) => SelectionState::Active(key.clone()),
            (None, false) => SelectionState::Unselected,
        }
    }

    /// The last settled key. Stays put while new inputs are resolving.
    pub fn active_key(&self) -> Option<&ConversationKey> {
        self.active.as_ref()
    }

    pub fn route(&self) -> Option<&ConversationKey> {
        self.route.as_ref()
    }

    pub fn pending_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Route identifiers persist until replaced or cleared.
    pub fn set_route(&mut self, route: Option<ConversationKey>) {
        if route.is_some() {
            self.resolving = true;
        }
        self.route = route;
    }

    pub fn set_hint(&mut self, counterpart_id: impl Into<String>) {
        self.hint = Some(counterpart_id.into());
        self.resolving = true;
    }

    pub fn click(&mut self, key: ConversationKey) {
        self.click = Some(key);
        self.resolving = true;
    }

    /// Settles pending inputs against the current directory.
    ///
    /// Returns the newly active key when the selection moved, which the
    /// caller must load exactly once. Re-resolving to the key already
    /// active returns `None`.
    ///
    /// A hint that arrives before the directory has ever loaded waits for
    /// the first successful refresh. After that it is consumed on first
    /// evaluation, and dropped without a transition when zero or several
    /// directory entries share that counterpart.
    pub fn resolve(&mut self, directory: &DirectoryView) -> Option<ConversationKey> {
        let click = self.click.take();
        let mut hint_waiting = false;

        let target = if let Some(route) = &self.route {
            if self.hint.take().is_some() {
                debug!("Navigation hint superseded by route {route}");
            }
            Some(route.clone())
        } else if let Some(hint) = self.hint.clone().filter(|_| directory.is_loaded()) {
            self.hint = None;
            let matches: Vec<ConversationKey> =
                directory.with_counterpart(&hint).map(|s| s.key()).collect();
            match matches.as_slice() {
                [only] => Some(only.clone()),
                _ => {
                    debug!(
                        "Dropping navigation hint for {hint}: {} matching conversations",
                        matches.len()
                    );
                    None
                }
            }
        } else {
            hint_waiting = self.hint.is_some();
            click
        };

        self.resolving = hint_waiting;

        match target {
            Some(key) if self.active.as_ref() != Some(&key) => {
                info!("Active conversation is now {key}");
                self.active = Some(key.clone());
                Some(key)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::summary;

    fn loaded(summaries: Vec<crate::models::ConversationSummary>) -> DirectoryView {
        DirectoryView::from_summaries(summaries)
    }

    fn key(l: &str, u: &str) -> ConversationKey {
        ConversationKey::new(l, u)
    }

    #[test]
    fn starts_unselected() {
        let mut sel = SelectionController::new();
        assert_eq!(sel.state(), SelectionState::Unselected);
        assert_eq!(sel.resolve(&DirectoryView::default()), None);
        assert_eq!(sel.state(), SelectionState::Unselected);
    }

    #[test]
    fn route_activates_even_when_absent_from_directory() {
        let mut sel = SelectionController::new();
        sel.set_route(Some(key("L9", "U9")));
        assert_eq!(sel.state(), SelectionState::Resolving);

        assert_eq!(sel.resolve(&DirectoryView::default()), Some(key("L9", "U9")));
        assert_eq!(sel.state(), SelectionState::Active(key("L9", "U9")));
    }

    #[test]
    fn route_outranks_hint_and_click() {
        let dir = loaded(vec![summary("L1", "U2", "Priya", "hi", 10)]);
        let mut sel = SelectionController::new();
        sel.set_hint("U2");
        sel.click(key("L1", "U2"));
        sel.set_route(Some(key("L5", "U5")));

        assert_eq!(sel.resolve(&dir), Some(key("L5", "U5")));
        assert_eq!(sel.pending_hint(), None);
        // The click was consumed by the evaluation it lost.
        assert_eq!(sel.resolve(&dir), None);
        assert_eq!(sel.active_key(), Some(&key("L5", "U5")));
    }

    #[test]
    fn hint_with_single_match_activates() {
        let dir = loaded(vec![
            summary("L1", "U2", "Priya", "hi", 10),
            summary("L2", "U3", "Rahul", "ok", 5),
        ]);
        let mut sel = SelectionController::new();
        sel.set_hint("U3");

        assert_eq!(sel.resolve(&dir), Some(key("L2", "U3")));
        assert_eq!(sel.pending_hint(), None);
    }

    #[test]
    fn ambiguous_hint_is_dropped() {
        let dir = loaded(vec![
            summary("L1", "U2", "Priya", "hi", 10),
            summary("L4", "U2", "Priya", "about the desk", 8),
        ]);
        let mut sel = SelectionController::new();
        sel.set_hint("U2");

        assert_eq!(sel.resolve(&dir), None);
        assert_eq!(sel.state(), SelectionState::Unselected);
        assert_eq!(sel.pending_hint(), None);
    }

    #[test]
    fn unmatched_hint_is_dropped() {
        let dir = loaded(vec![summary("L1", "U2", "Priya", "hi", 10)]);
        let mut sel = SelectionController::new();
        sel.set_hint("U7");

        assert_eq!(sel.resolve(&dir), None);
        assert_eq!(sel.pending_hint(), None);
        assert_eq!(sel.state(), SelectionState::Unselected);
    }

    #[test]
    fn hint_waits_for_first_directory_load() {
        let mut sel = SelectionController::new();
        sel.set_hint("U2");

        assert_eq!(sel.resolve(&DirectoryView::default()), None);
        assert_eq!(sel.state(), SelectionState::Resolving);
        assert_eq!(sel.pending_hint(), Some("U2"));

        let dir = loaded(vec![summary("L1", "U2", "Priya", "hi", 10)]);
        assert_eq!(sel.resolve(&dir), Some(key("L1", "U2")));
    }

    #[test]
    fn click_activates_and_repeat_click_does_not_reload() {
        let dir = loaded(vec![summary("L1", "U2", "Priya", "hi", 10)]);
        let mut sel = SelectionController::new();

        sel.click(key("L1", "U2"));
        assert_eq!(sel.resolve(&dir), Some(key("L1", "U2")));

        sel.click(key("L1", "U2"));
        assert_eq!(sel.resolve(&dir), None);
        assert_eq!(sel.state(), SelectionState::Active(key("L1", "U2")));
    }

    #[test]
    fn clearing_route_lets_clicks_through() {
        let dir = loaded(vec![summary("L1", "U2", "Priya", "hi", 10)]);
        let mut sel = SelectionController::new();
        sel.set_route(Some(key("L5", "U5")));
        sel.resolve(&dir);

        sel.set_route(None);
        sel.click(key("L1", "U2"));
        assert_eq!(sel.resolve(&dir), Some(key("L1", "U2")));
    }
}
