//! Editor service — local page actions applied to `PagesState`.
//!
//! DESIGN
//! ======
//! Grid mutations go through [`mutate`], which takes the state lock,
//! applies a `services::layout` operation to the working copy in
//! `current_page`, and only when it changed something flips
//! `unsaved_changes`, tags the page dirty, and schedules a cache write of
//! the collection. With no page open every action is a no-op.
//!
//! Nothing here talks to the remote store.

use tracing::debug;

use super::layout::{self, SpanAdjust, SpanOutcome};
use crate::grid::{Component, Page};
use crate::registry::{ContentTypeRegistry, RegistryError};
use crate::state::{AppState, PagesState, SyncStatus};

// =============================================================================
// WRITE-THROUGH
// =============================================================================

/// Schedule a cache write of the collection for the state's tenant.
pub(crate) fn write_through(app: &AppState, state: &PagesState) {
    if state.tenant.is_empty() {
        debug!("no tenant set; skipping cache write");
        return;
    }
    app.cache.save(&state.pages, &state.tenant);
}

/// Apply `op` to the working copy. `None` when no page is open.
async fn mutate<R>(app: &AppState, op: impl FnOnce(&mut Page) -> R, applied: impl Fn(&R) -> bool) -> Option<R> {
    let mut state = app.pages.write().await;
    let page = state.current_page.as_mut()?;
    let result = op(page);
    if applied(&result) {
        let key = page.key.clone();
        state.unsaved_changes = true;
        state.set_sync(&key, SyncStatus::Dirty);
        write_through(app, &state);
    }
    Some(result)
}

async fn mutate_flag(app: &AppState, op: impl FnOnce(&mut Page) -> bool) -> bool {
    mutate(app, op, |changed| *changed)
        .await
        .unwrap_or(false)
}

// =============================================================================
// GRID ACTIONS
// =============================================================================

pub async fn add_row(app: &AppState) -> bool {
    mutate_flag(app, layout::add_row).await
}

/// Remove a row by id. Keeping at least one row is the caller's job.
pub async fn remove_row(app: &AppState, row_id: &str) -> bool {
    mutate_flag(app, |page| layout::remove_row(page, row_id)).await
}

pub async fn add_component(app: &AppState, component: Component, row_id: &str, cell_id: &str) -> bool {
    mutate_flag(app, |page| layout::add_component(page, component, row_id, cell_id)).await
}

pub async fn update_component(app: &AppState, component: Component) -> bool {
    mutate_flag(app, |page| layout::update_component(page, component)).await
}

pub async fn remove_component(app: &AppState, component_id: &str) -> bool {
    mutate_flag(app, |page| layout::remove_component(page, component_id)).await
}

pub async fn move_component(app: &AppState, component_id: &str, source: (&str, &str), target: (&str, &str)) -> bool {
    mutate_flag(app, |page| layout::move_component(page, component_id, source, target)).await
}

/// Resize a cell. `Missing` also covers "no page open".
pub async fn update_cell_span(app: &AppState, row_id: &str, cell_id: &str, col_span: usize, adjust: SpanAdjust) -> SpanOutcome {
    mutate(
        app,
        |page| layout::update_cell_span(page, row_id, cell_id, col_span, adjust),
        |outcome| outcome.applied(),
    )
    .await
    .unwrap_or(SpanOutcome::Missing)
}

/// Instantiate `content_type` with its defaults and drop it into a cell.
///
/// Returns the new component's id, or `None` if it could not be placed.
///
/// # Errors
///
/// Returns `UnknownType` if the content type is not registered.
pub async fn drop_new_component(
    app: &AppState,
    registry: &ContentTypeRegistry,
    content_type: &str,
    row_id: &str,
    cell_id: &str,
) -> Result<Option<String>, RegistryError> {
    let component = registry.instantiate(content_type)?;
    let id = component.id.clone();
    let placed = add_component(app, component, row_id, cell_id).await;
    Ok(placed.then_some(id))
}

// =============================================================================
// PAGE ACTIONS
// =============================================================================

/// Open the page with `key` for editing, or close the editor if absent.
pub async fn set_current_page(app: &AppState, key: &str) {
    let mut state = app.pages.write().await;
    let page = state.page(key).cloned();
    state.current_page = page;
}

/// Create a blank page, add it to the collection, and open it.
pub async fn create_empty_page(app: &AppState, name: &str, route: &str, tenant: &str) -> Page {
    let page = Page::new_empty(name, route, tenant);
    let mut state = app.pages.write().await;
    state.pages.push(page.clone());
    state.current_page = Some(page.clone());
    state.unsaved_changes = true;
    state.tenant = tenant.to_owned();
    state.set_sync(&page.key, SyncStatus::Dirty);
    write_through(app, &state);
    page
}

pub async fn set_tenant(app: &AppState, tenant: &str) {
    app.pages.write().await.tenant = tenant.to_owned();
}

/// Mark local edits clean without touching any store.
pub async fn save_current_page(app: &AppState) {
    let mut state = app.pages.write().await;
    state.unsaved_changes = false;
    if let Some(key) = state.current_page.as_ref().map(|p| p.key.clone()) {
        state.set_sync(&key, SyncStatus::Clean);
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
