//! Layout service — grid mutations on a single page.
//!
//! DESIGN
//! ======
//! Every operation takes the page under edit by `&mut` and reports whether
//! it changed anything. Unresolved row, cell, or component ids degrade to
//! a no-op rather than an error; callers decide whether a `false` matters.
//! The editor service wraps these calls to flip the unsaved flag and write
//! through to the cache only when a mutation actually applied.
//!
//! Row-sum invariant: after `add_row` and after a compensated
//! `update_cell_span` the touched row spans exactly `COLUMN_COUNT`, or the
//! returned `SpanOutcome` says it does not. Raw span edits leave that to
//! the caller.

use crate::grid::{Cell, Component, Page, Row};

// =============================================================================
// TYPES
// =============================================================================

/// Result of a span change, reporting the row's state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOutcome {
    /// Row or cell id did not resolve; nothing changed.
    Missing,
    /// The cell already had the requested span; nothing changed.
    Unchanged,
    /// Compensation ran and the row spans exactly `COLUMN_COUNT`.
    Balanced,
    /// Compensation ran but the row does not span `COLUMN_COUNT`: too few
    /// empty cells to reclaim, or reclaimed cells wider than one column.
    Unbalanced { span_total: usize },
    /// The span changed with no compensation requested.
    Raw,
}

impl SpanOutcome {
    /// Whether the page was modified.
    #[must_use]
    pub fn applied(self) -> bool {
        !matches!(self, Self::Missing | Self::Unchanged)
    }
}

/// Compensation flags for [`update_cell_span`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanAdjust {
    /// On growth, drop empty sibling cells to reclaim columns.
    pub remove_empty: bool,
    /// On shrink, insert empty cells after the resized one.
    pub add_empty: bool,
}

impl SpanAdjust {
    pub const NONE: Self = Self { remove_empty: false, add_empty: false };
    pub const BOTH: Self = Self { remove_empty: true, add_empty: true };
}

// =============================================================================
// ROWS
// =============================================================================

/// Append a canonical empty row.
pub fn add_row(page: &mut Page) -> bool {
    page.layout.rows.push(Row::empty());
    true
}

/// Remove the row with `row_id`. Returns `false` if no row matched.
///
/// The last remaining row is removable here; keeping at least one row is
/// the caller's contract.
pub fn remove_row(page: &mut Page, row_id: &str) -> bool {
    let before = page.layout.rows.len();
    page.layout.rows.retain(|row| row.id != row_id);
    page.layout.rows.len() != before
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// Place a new component into a cell.
///
/// Both ids must resolve; otherwise neither the component list nor any
/// cell changes.
pub fn add_component(page: &mut Page, component: Component, row_id: &str, cell_id: &str) -> bool {
    let Some(cell) = page.cell_mut(row_id, cell_id) else {
        return false;
    };
    cell.component_id = Some(component.id.clone());
    page.components.push(component);
    true
}

/// Replace the component with the same id in place.
pub fn update_component(page: &mut Page, component: Component) -> bool {
    let Some(slot) = page
        .components
        .iter_mut()
        .find(|c| c.id == component.id)
    else {
        return false;
    };
    *slot = component;
    true
}

/// Delete a component and clear every cell that referenced it.
pub fn remove_component(page: &mut Page, component_id: &str) -> bool {
    let before = page.components.len();
    page.components.retain(|c| c.id != component_id);
    let mut changed = page.components.len() != before;

    for cell in page
        .layout
        .rows
        .iter_mut()
        .flat_map(|row| row.cells.iter_mut())
    {
        if cell.component_id.as_deref() == Some(component_id) {
            cell.component_id = None;
            changed = true;
        }
    }

    changed
}

/// Relocate a component reference between cells.
///
/// Source and target resolve independently: an unresolved source still
/// lets the target be set, and vice versa. The source is cleared without
/// checking what it held.
pub fn move_component(
    page: &mut Page,
    component_id: &str,
    source: (&str, &str),
    target: (&str, &str),
) -> bool {
    let mut changed = false;

    if let Some(cell) = page.cell_mut(source.0, source.1) {
        cell.component_id = None;
        changed = true;
    }
    if let Some(cell) = page.cell_mut(target.0, target.1) {
        cell.component_id = Some(component_id.to_owned());
        changed = true;
    }

    changed
}

// =============================================================================
// SPANS
// =============================================================================

/// Resize a cell, optionally compensating so the row stays balanced.
///
/// Growth with `remove_empty` drops up to `col_span - old_span` empty
/// sibling cells, taking them in row order regardless of their own span.
/// Shrink with `add_empty` inserts `old_span - col_span` empty cells of
/// span 1 right after the resized cell. Either way the outcome reports
/// whether the row actually spans `COLUMN_COUNT` afterwards.
pub fn update_cell_span(page: &mut Page, row_id: &str, cell_id: &str, col_span: usize, adjust: SpanAdjust) -> SpanOutcome {
    let Some(row) = page.row_mut(row_id) else {
        return SpanOutcome::Missing;
    };
    let Some(index) = row.cell_index(cell_id) else {
        return SpanOutcome::Missing;
    };

    let old_span = row.cells[index].col_span;
    if col_span == old_span {
        return SpanOutcome::Unchanged;
    }
    row.cells[index].col_span = col_span;

    if col_span > old_span && adjust.remove_empty {
        let wanted = col_span - old_span;
        let reclaim: Vec<usize> = row
            .cells
            .iter()
            .enumerate()
            .filter(|(idx, cell)| *idx != index && cell.is_empty())
            .map(|(idx, _)| idx)
            .take(wanted)
            .collect();

        // Remove back to front so earlier indices stay valid.
        for idx in reclaim.iter().rev() {
            row.cells.remove(*idx);
        }
        return settled(row);
    }

    if col_span < old_span && adjust.add_empty {
        let fill = old_span - col_span;
        let at = index + 1;
        row.cells
            .splice(at..at, (0..fill).map(|_| Cell::empty()));
        return settled(row);
    }

    SpanOutcome::Raw
}

/// Outcome of a compensated edit, judged by columns rather than cells.
fn settled(row: &Row) -> SpanOutcome {
    if row.is_balanced() {
        SpanOutcome::Balanced
    } else {
        SpanOutcome::Unbalanced { span_total: row.span_total() }
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
