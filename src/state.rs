//! Shared page-editing state.
//!
//! DESIGN
//! ======
//! `AppState` is cloned into every caller and background task. It holds
//! the single mutable `PagesState` behind a lock, the remote gateway, the
//! write-through cache, and a broadcast channel of action lifecycle events
//! the presentation layer can subscribe to.
//!
//! `current_page` is a working copy: grid edits land there and only reach
//! `pages` when a save round-trips through the gateway. Each page key
//! carries a sync tag so callers can tell clean, edited, and in-flight
//! pages apart without comparing copies.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::grid::Page;
use crate::services::cache::CacheStore;
use crate::services::gateway::PageGateway;

const EVENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// ACTION EVENTS
// =============================================================================

/// Asynchronous actions exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    FetchPages,
    SyncPages,
    FetchPage,
    CreatePage,
    UpdatePage,
    DeletePage,
}

/// Lifecycle phase of one action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Fulfilled,
    Rejected,
    /// A newer invocation superseded this one; its response was dropped.
    Discarded,
    /// Background sync did not run because local edits are unsaved.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    pub action: Action,
    pub phase: Phase,
    /// Page key for single-page actions.
    pub key: Option<String>,
}

// =============================================================================
// SYNC TAGS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncStatus {
    /// Matches the last confirmed remote copy.
    #[default]
    Clean,
    /// Edited locally and not yet saved.
    Dirty,
    /// A create or update is in flight.
    Syncing,
}

// =============================================================================
// REQUEST GENERATIONS
// =============================================================================

/// Monotonic request counters used to drop superseded responses.
///
/// Collection-wide actions share one counter; single-page actions count
/// per key. The newest pending `fetch_pages` is tracked on its own so a
/// background sync never supersedes it.
#[derive(Debug, Clone, Default)]
pub struct RequestGenerations {
    collection: u64,
    fetching: Option<u64>,
    pages: HashMap<String, u64>,
}

impl RequestGenerations {
    pub fn begin_collection(&mut self) -> u64 {
        self.collection += 1;
        self.collection
    }

    /// Claim a collection generation for a user-triggered fetch.
    pub fn begin_fetch(&mut self) -> u64 {
        let generation = self.begin_collection();
        self.fetching = Some(generation);
        generation
    }

    /// Settle a fetch. Only the newest pending fetch clears the marker.
    pub fn finish_fetch(&mut self, generation: u64) {
        if self.fetching == Some(generation) {
            self.fetching = None;
        }
    }

    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.fetching.is_some()
    }

    #[must_use]
    pub fn is_current_collection(&self, generation: u64) -> bool {
        self.collection == generation
    }

    pub fn begin(&mut self, key: &str) -> u64 {
        let counter = self.pages.entry(key.to_owned()).or_insert(0);
        *counter += 1;
        *counter
    }

    #[must_use]
    pub fn is_current(&self, key: &str, generation: u64) -> bool {
        self.pages.get(key).copied() == Some(generation)
    }
}

// =============================================================================
// PAGES STATE
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct PagesState {
    /// Confirmed page collection, in store order, unique by key.
    pub pages: Vec<Page>,
    /// Working copy of the page under edit.
    pub current_page: Option<Page>,
    pub loading: bool,
    pub error: Option<String>,
    pub unsaved_changes: bool,
    /// Tenant identifier (business unit key) scoping cache and remote.
    pub tenant: String,
    pub sync: HashMap<String, SyncStatus>,
    pub generations: RequestGenerations,
}

impl PagesState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(&self, key: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.key == key)
    }

    /// Replace the page with the same key, or append it.
    pub fn upsert_page(&mut self, page: Page) {
        match self.pages.iter_mut().find(|p| p.key == page.key) {
            Some(slot) => *slot = page,
            None => self.pages.push(page),
        }
    }

    /// Remove a page by key. Returns `true` if one was removed.
    pub fn remove_page(&mut self, key: &str) -> bool {
        let before = self.pages.len();
        self.pages.retain(|p| p.key != key);
        self.pages.len() != before
    }

    /// Replace `current_page` with `page` if it has the same key.
    pub fn mirror_current(&mut self, page: &Page) {
        if self
            .current_page
            .as_ref()
            .is_some_and(|current| current.key == page.key)
        {
            self.current_page = Some(page.clone());
        }
    }

    #[must_use]
    pub fn sync_status(&self, key: &str) -> SyncStatus {
        self.sync.get(key).copied().unwrap_or_default()
    }

    pub fn set_sync(&mut self, key: &str, status: SyncStatus) {
        self.sync.insert(key.to_owned(), status);
    }

    /// Tag every page in the collection clean, dropping stale tags.
    pub fn mark_all_clean(&mut self) {
        self.sync = self
            .pages
            .iter()
            .map(|p| (p.key.clone(), SyncStatus::Clean))
            .collect();
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared handle to the page-editing state and its collaborators.
/// Clone is cheap; every field is Arc-wrapped or a channel handle.
#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<RwLock<PagesState>>,
    pub gateway: Arc<dyn PageGateway>,
    pub cache: Arc<CacheStore>,
    pub events: broadcast::Sender<ActionEvent>,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: Arc<dyn PageGateway>, cache: Arc<CacheStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { pages: Arc::new(RwLock::new(PagesState::new())), gateway, cache, events }
    }

    /// Receive lifecycle events for actions started after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ActionEvent> {
        self.events.subscribe()
    }

    /// Copy of the current state for rendering.
    pub async fn snapshot(&self) -> PagesState {
        self.pages.read().await.clone()
    }

    pub(crate) fn emit(&self, action: Action, phase: Phase, key: Option<&str>) {
        // No subscribers is fine.
        let _ = self
            .events
            .send(ActionEvent { action, phase, key: key.map(str::to_owned) });
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    fn page(key: &str) -> Page {
        let mut page = Page::new_empty(key, "/", "bu");
        page.key = key.to_owned();
        page
    }

    #[test]
    fn pages_state_new_is_empty() {
        let state = PagesState::new();
        assert!(state.pages.is_empty());
        assert!(state.current_page.is_none());
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(!state.unsaved_changes);
    }

    #[test]
    fn upsert_replaces_by_key_and_keeps_order() {
        let mut state = PagesState::new();
        state.upsert_page(page("a"));
        state.upsert_page(page("b"));
        let mut renamed = page("a");
        renamed.name = "renamed".into();
        state.upsert_page(renamed);

        let keys: Vec<&str> = state.pages.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(state.page("a").unwrap().name, "renamed");
    }

    #[test]
    fn remove_page_reports_presence() {
        let mut state = PagesState::new();
        state.upsert_page(page("a"));
        assert!(state.remove_page("a"));
        assert!(!state.remove_page("a"));
    }

    #[test]
    fn mirror_current_only_on_matching_key() {
        let mut state = PagesState::new();
        state.current_page = Some(page("a"));

        let mut other = page("b");
        other.name = "other".into();
        state.mirror_current(&other);
        assert_eq!(state.current_page.as_ref().unwrap().key, "a");

        let mut fresh = page("a");
        fresh.name = "fresh".into();
        state.mirror_current(&fresh);
        assert_eq!(state.current_page.as_ref().unwrap().name, "fresh");
    }

    #[test]
    fn generations_supersede_older_requests() {
        let mut gens = RequestGenerations::default();
        let first = gens.begin("a");
        let second = gens.begin("a");
        let other = gens.begin("b");
        assert!(!gens.is_current("a", first));
        assert!(gens.is_current("a", second));
        assert!(gens.is_current("b", other));
        assert!(!gens.is_current("c", 1));

        let c1 = gens.begin_collection();
        let c2 = gens.begin_collection();
        assert!(!gens.is_current_collection(c1));
        assert!(gens.is_current_collection(c2));
    }

    #[test]
    fn fetch_marker_cleared_only_by_newest_fetch() {
        let mut gens = RequestGenerations::default();
        assert!(!gens.is_fetching());

        let first = gens.begin_fetch();
        let second = gens.begin_fetch();
        assert!(gens.is_fetching());

        gens.finish_fetch(first);
        assert!(gens.is_fetching());
        gens.finish_fetch(second);
        assert!(!gens.is_fetching());
    }

    #[test]
    fn sync_status_defaults_clean() {
        let mut state = PagesState::new();
        assert_eq!(state.sync_status("x"), SyncStatus::Clean);
        state.set_sync("x", SyncStatus::Dirty);
        assert_eq!(state.sync_status("x"), SyncStatus::Dirty);

        state.upsert_page(page("y"));
        state.mark_all_clean();
        assert!(!state.sync.contains_key("x"));
        assert_eq!(state.sync_status("y"), SyncStatus::Clean);
    }
}
