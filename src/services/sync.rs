//! Sync service — remote page actions and background reconciliation.
//!
//! DESIGN
//! ======
//! Each action runs in three steps: a pending step under the state lock
//! (set `loading`, clear `error`, claim a request generation), the
//! gateway call with the lock released, and a settle step under the lock
//! again. The settle step drops the response if a newer invocation for the
//! same key (or the whole collection) has started since, so a slow stale
//! reply never overwrites a fresh one.
//!
//! `fetch_pages` reads the cache first and only goes remote on a miss.
//! `sync_pages` always goes remote and is the background refresh; it
//! refuses to run, and refuses to apply, while local edits are unsaved.
//! It also yields to `fetch_pages`: it never starts while a fetch is
//! pending, and a fetch started mid-sync supersedes it.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here returns an error. Read failures in `fetch_pages` degrade
//! to an empty collection; background sync failures are logged; single-page
//! failures land in `PagesState::error` with the gateway's fixed message.
//! There is no retry.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::editor::{save_current_page, write_through};
use super::gateway::GatewayError;
use crate::grid::Page;
use crate::state::{Action, AppState, Phase, SyncStatus};

/// Default background sync period (5 minutes).
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
/// Default delay before the first background sync.
pub const DEFAULT_SYNC_INITIAL_DELAY_MS: u64 = 100;

// =============================================================================
// COLLECTION
// =============================================================================

/// Load the page collection, cache first.
///
/// Never rejects: a remote failure settles as an empty collection.
pub async fn fetch_pages(app: &AppState, tenant: &str) -> Phase {
    let generation = {
        let mut state = app.pages.write().await;
        state.loading = true;
        state.error = None;
        state.generations.begin_fetch()
    };
    app.emit(Action::FetchPages, Phase::Pending, None);

    let pages = match app.cache.load(tenant) {
        Some(pages) => {
            debug!(%tenant, count = pages.len(), "pages served from cache");
            pages
        }
        None => match app.gateway.fetch_pages().await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(error = %e, %tenant, "remote page fetch failed; using empty collection");
                Vec::new()
            }
        },
    };

    let mut state = app.pages.write().await;
    state.generations.finish_fetch(generation);
    if !state.generations.is_current_collection(generation) {
        debug!(%tenant, "superseded fetch_pages response dropped");
        if !state.generations.is_fetching() {
            state.loading = false;
        }
        app.emit(Action::FetchPages, Phase::Discarded, None);
        return Phase::Discarded;
    }

    state.loading = false;
    state.pages = pages;
    state.unsaved_changes = false;
    state.mark_all_clean();
    let carried = state
        .pages
        .first()
        .map(|p| p.business_unit_key.clone())
        .filter(|t| !t.is_empty());
    if let Some(carried) = carried {
        state.tenant = carried;
    } else if state.tenant.is_empty() {
        state.tenant = tenant.to_owned();
    }
    write_through(app, &state);

    info!(tenant = %state.tenant, count = state.pages.len(), "pages loaded");
    app.emit(Action::FetchPages, Phase::Fulfilled, None);
    Phase::Fulfilled
}

/// Background refresh from the remote store.
///
/// Skipped without contacting the gateway while edits are unsaved or a
/// `fetch_pages` is pending. A response that lands after edits began, or
/// after a `fetch_pages` started, is dropped as well.
pub async fn sync_pages(app: &AppState) -> Phase {
    let generation = {
        let mut state = app.pages.write().await;
        if state.unsaved_changes {
            debug!("unsaved changes; background sync skipped");
            app.emit(Action::SyncPages, Phase::Skipped, None);
            return Phase::Skipped;
        }
        if state.generations.is_fetching() {
            debug!("page fetch in flight; background sync skipped");
            app.emit(Action::SyncPages, Phase::Skipped, None);
            return Phase::Skipped;
        }
        state.generations.begin_collection()
    };
    app.emit(Action::SyncPages, Phase::Pending, None);

    let pages = match app.gateway.fetch_pages().await {
        Ok(pages) => pages,
        Err(e) => {
            warn!(error = %e, "background sync failed");
            app.emit(Action::SyncPages, Phase::Rejected, None);
            return Phase::Rejected;
        }
    };

    let mut state = app.pages.write().await;
    if state.unsaved_changes || !state.generations.is_current_collection(generation) {
        debug!("background sync response dropped");
        app.emit(Action::SyncPages, Phase::Discarded, None);
        return Phase::Discarded;
    }

    state.pages = pages;
    let fresh = state
        .current_page
        .as_ref()
        .and_then(|current| state.page(&current.key))
        .cloned();
    if fresh.is_some() {
        state.current_page = fresh;
    }
    state.mark_all_clean();
    write_through(app, &state);

    debug!(count = state.pages.len(), "background sync applied");
    app.emit(Action::SyncPages, Phase::Fulfilled, None);
    Phase::Fulfilled
}

/// Run `sync_pages` once after `initial_delay`, then every `interval`.
///
/// Returns the task handle; abort it to stop syncing.
pub fn spawn_sync_task(app: AppState, initial_delay: Duration, interval: Duration) -> JoinHandle<()> {
    info!(?initial_delay, ?interval, "background sync configured");
    tokio::spawn(async move {
        tokio::time::sleep(initial_delay).await;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sync_pages(&app).await;
        }
    })
}

// =============================================================================
// SINGLE PAGE
// =============================================================================

/// Claim a generation for `key` and enter the pending phase.
async fn begin(app: &AppState, action: Action, key: &str, syncing: bool) -> u64 {
    let generation = {
        let mut state = app.pages.write().await;
        state.loading = true;
        state.error = None;
        if syncing {
            state.set_sync(key, SyncStatus::Syncing);
        }
        state.generations.begin(key)
    };
    app.emit(action, Phase::Pending, Some(key));
    generation
}

/// Record a failure unless superseded. Returns the terminal phase.
async fn reject(app: &AppState, action: Action, key: &str, generation: u64, err: &GatewayError) -> Phase {
    let mut state = app.pages.write().await;
    if !state.generations.is_current(key, generation) {
        app.emit(action, Phase::Discarded, Some(key));
        return Phase::Discarded;
    }
    warn!(error = %err, %key, ?action, "page action failed");
    state.loading = false;
    state.error = Some(err.message());
    if state.sync_status(key) == SyncStatus::Syncing {
        state.set_sync(key, SyncStatus::Dirty);
    }
    app.emit(action, Phase::Rejected, Some(key));
    Phase::Rejected
}

/// Upsert a confirmed page unless superseded. Returns the terminal phase.
async fn settle(app: &AppState, action: Action, generation: u64, page: Page) -> Phase {
    let key = page.key.clone();
    let mut state = app.pages.write().await;
    if !state.generations.is_current(&key, generation) {
        debug!(%key, ?action, "superseded response dropped");
        app.emit(action, Phase::Discarded, Some(&key));
        return Phase::Discarded;
    }

    state.loading = false;
    state.mirror_current(&page);
    if matches!(action, Action::CreatePage | Action::UpdatePage) {
        state.unsaved_changes = false;
    }
    if action == Action::CreatePage && !page.business_unit_key.is_empty() {
        state.tenant = page.business_unit_key.clone();
    }
    state.upsert_page(page);
    state.set_sync(&key, SyncStatus::Clean);
    write_through(app, &state);

    app.emit(action, Phase::Fulfilled, Some(&key));
    Phase::Fulfilled
}

/// Fetch one page and upsert it.
pub async fn fetch_page(app: &AppState, key: &str) -> Phase {
    let generation = begin(app, Action::FetchPage, key, false).await;
    match app.gateway.fetch_page(key).await {
        Ok(page) => settle(app, Action::FetchPage, generation, page).await,
        Err(e) => reject(app, Action::FetchPage, key, generation, &e).await,
    }
}

/// Create `page` remotely and upsert the stored copy.
pub async fn create_page(app: &AppState, page: Page) -> Phase {
    let generation = begin(app, Action::CreatePage, &page.key, true).await;
    match app.gateway.create_page(&page).await {
        Ok(stored) => settle(app, Action::CreatePage, generation, stored).await,
        Err(e) => reject(app, Action::CreatePage, &page.key, generation, &e).await,
    }
}

/// Update `page` remotely and upsert the stored copy.
pub async fn update_page(app: &AppState, page: Page) -> Phase {
    let generation = begin(app, Action::UpdatePage, &page.key, true).await;
    match app.gateway.update_page(&page).await {
        Ok(stored) => settle(app, Action::UpdatePage, generation, stored).await,
        Err(e) => reject(app, Action::UpdatePage, &page.key, generation, &e).await,
    }
}

/// Delete a page remotely, then drop it locally.
pub async fn delete_page(app: &AppState, key: &str) -> Phase {
    let generation = begin(app, Action::DeletePage, key, false).await;
    if let Err(e) = app.gateway.delete_page(key).await {
        return reject(app, Action::DeletePage, key, generation, &e).await;
    }

    let mut state = app.pages.write().await;
    if !state.generations.is_current(key, generation) {
        app.emit(Action::DeletePage, Phase::Discarded, Some(key));
        return Phase::Discarded;
    }
    state.loading = false;
    state.remove_page(key);
    if state
        .current_page
        .as_ref()
        .is_some_and(|p| p.key == key)
    {
        state.current_page = None;
    }
    state.sync.remove(key);
    write_through(app, &state);

    app.emit(Action::DeletePage, Phase::Fulfilled, Some(key));
    Phase::Fulfilled
}

// =============================================================================
// SAVE / DISCARD
// =============================================================================

/// Push the working copy to the remote store. `None` with no page open.
pub async fn save_changes(app: &AppState) -> Option<Phase> {
    let current = app.pages.read().await.current_page.clone()?;
    Some(update_page(app, current).await)
}

/// Drop local edits: mark clean, then reload from the remote store so the
/// working copy reverts to the confirmed version.
pub async fn discard_changes(app: &AppState) -> Phase {
    save_current_page(app).await;
    sync_pages(app).await
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
