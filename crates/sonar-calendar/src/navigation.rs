//! Deep-link navigation.
//!
//! An open details view is mirrored in the navigation history as a
//! `#event-<id>` fragment. Opening pushes an entry so that "back" returns to
//! the list; closing replaces the current entry so the history does not grow.
//!
//! The host's history is abstracted by [`History`]. Hosts call
//! [`NavigationBridge::handle_pop_state`] after the user moved back or
//! forward; the bridge decodes the fragment and notifies its listeners.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

const EVENT_FRAGMENT_PREFIX: &str = "#event-";

/// Builds the deep-link fragment for an event id.
pub fn event_fragment(event_id: &str) -> String {
    format!("{}{}", EVENT_FRAGMENT_PREFIX, event_id)
}

/// Extracts the event id from a deep-link fragment.
///
/// Returns `None` for fragments that don't encode an event (or encode an
/// empty id).
pub fn parse_event_fragment(fragment: &str) -> Option<&str> {
    fragment
        .strip_prefix(EVENT_FRAGMENT_PREFIX)
        .filter(|id| !id.is_empty())
}

/// The host's navigation history.
pub trait History: Send + Sync {
    /// Fragment of the current entry (including the leading `#`).
    fn fragment(&self) -> Option<String>;

    /// Pushes a new entry.
    fn push_state(&self, fragment: Option<&str>);

    /// Replaces the current entry.
    fn replace_state(&self, fragment: Option<&str>);
}

#[derive(Debug)]
struct Entries {
    stack: Vec<Option<String>>,
    cursor: usize,
}

/// A history kept in memory, with browser-like back/forward.
///
/// Pushing discards any forward entries, as browsers do.
#[derive(Debug)]
pub struct InMemoryHistory {
    entries: Mutex<Entries>,
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHistory {
    /// Creates a history with a single entry without fragment.
    pub fn new() -> Self {
        Self::with_fragment(None)
    }

    /// Creates a history whose initial entry has the given fragment, as when
    /// the page was opened from a deep link.
    pub fn with_fragment(fragment: Option<&str>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                stack: vec![fragment.map(str::to_string)],
                cursor: 0,
            }),
        }
    }

    /// Moves one entry back. Returns false at the start of the history.
    pub fn back(&self) -> bool {
        let mut entries = self.lock();
        if entries.cursor == 0 {
            return false;
        }
        entries.cursor -= 1;
        true
    }

    /// Moves one entry forward. Returns false at the end of the history.
    pub fn forward(&self) -> bool {
        let mut entries = self.lock();
        if entries.cursor + 1 >= entries.stack.len() {
            return false;
        }
        entries.cursor += 1;
        true
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().stack.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl History for InMemoryHistory {
    fn fragment(&self) -> Option<String> {
        let entries = self.lock();
        entries.stack[entries.cursor].clone()
    }

    fn push_state(&self, fragment: Option<&str>) {
        let mut entries = self.lock();
        let next = entries.cursor + 1;
        entries.stack.truncate(next);
        entries.stack.push(fragment.map(str::to_string));
        entries.cursor = next;
    }

    fn replace_state(&self, fragment: Option<&str>) {
        let mut entries = self.lock();
        let cursor = entries.cursor;
        entries.stack[cursor] = fragment.map(str::to_string);
    }
}

/// What a history move means for the details view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Show details for the event with this id.
    Open(String),
    /// Hide the details view.
    Close,
}

/// Receives navigation events from a [`NavigationBridge`].
pub trait NavigationListener: Send + Sync {
    /// Whether the listener knows an event with this id.
    ///
    /// Unknown ids are reported as [`NavigationEvent::Close`].
    fn contains_event(&self, event_id: &str) -> bool;

    fn on_navigation(&self, event: NavigationEvent);
}

/// Handle returned by [`NavigationBridge::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Maps "an event is open" to history entries.
pub struct NavigationBridge {
    history: Arc<dyn History>,
    listeners: Mutex<Vec<(SubscriptionId, Arc<dyn NavigationListener>)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for NavigationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationBridge")
            .field("fragment", &self.history.fragment())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl NavigationBridge {
    pub fn new(history: Arc<dyn History>) -> Self {
        Self {
            history,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// A bridge over a fresh [`InMemoryHistory`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryHistory::new()))
    }

    pub fn history(&self) -> &Arc<dyn History> {
        &self.history
    }

    /// Id encoded in the current fragment, if any.
    pub fn current_event_id(&self) -> Option<String> {
        self.history
            .fragment()
            .as_deref()
            .and_then(parse_event_fragment)
            .map(str::to_string)
    }

    /// Pushes a history entry for the event.
    ///
    /// Nothing is pushed when the current entry already encodes this id, so
    /// restoring a deep link or re-opening after a pop does not grow the
    /// history.
    pub fn open(&self, event_id: &str) {
        if self.current_event_id().as_deref() == Some(event_id) {
            trace!(event_id, "fragment already points at event");
            return;
        }
        debug!(event_id, "pushing event fragment");
        self.history.push_state(Some(&event_fragment(event_id)));
    }

    /// Strips the event fragment from the current entry, if present.
    pub fn close(&self) {
        if self.current_event_id().is_some() {
            debug!("clearing event fragment");
            self.history.replace_state(None);
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn NavigationListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, listener));
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    /// Decodes the current fragment and notifies every listener.
    pub fn handle_pop_state(&self) {
        let event_id = self.current_event_id();
        // Listeners may call back into the bridge.
        let listeners: Vec<_> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        debug!(event_id = ?event_id, listeners = listeners.len(), "pop state");
        for listener in listeners {
            let event = match event_id.as_deref() {
                Some(id) if listener.contains_event(id) => NavigationEvent::Open(id.to_string()),
                _ => NavigationEvent::Close,
            };
            listener.on_navigation(event);
        }
    }

    fn lock_listeners(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Arc<dyn NavigationListener>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
