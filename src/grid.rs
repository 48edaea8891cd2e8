//! Grid model — pages, layouts, rows, cells, and placed components.
//!
//! DESIGN
//! ======
//! Plain serde value types. A page's layout is an ordered list of rows;
//! each row is an ordered list of cells whose `col_span` values sum to
//! [`COLUMN_COUNT`]. A cell optionally references one component by id.
//! Nothing here enforces the invariants on construction: the mutation
//! engine (`services::layout`) is responsible for keeping them.
//!
//! The wire shape is camelCase JSON so cached and remote payloads stay
//! interchangeable with the page store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Total column count every row spans.
pub const COLUMN_COUNT: usize = 4;

/// JSON property bag carried by a component.
pub type Properties = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// PAGE
// =============================================================================

/// A composable page: grid layout plus the components placed into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Stable store key (`page-{uuid}`). Immutable once assigned.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub uuid: String,
    pub route: String,
    /// Tenant identifier (business unit key) the page belongs to.
    #[serde(default)]
    pub business_unit_key: String,
    pub layout: Layout,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Page {
    /// Build a fresh page with a single empty row and no components.
    #[must_use]
    pub fn new_empty(name: &str, route: &str, tenant: &str) -> Self {
        Self {
            key: format!("page-{}", Uuid::new_v4()),
            name: name.to_owned(),
            uuid: Uuid::new_v4().to_string(),
            route: route.to_owned(),
            business_unit_key: tenant.to_owned(),
            layout: Layout { rows: vec![Row::empty()] },
            components: Vec::new(),
        }
    }

    #[must_use]
    pub fn component(&self, component_id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == component_id)
    }

    #[must_use]
    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.layout.rows.iter().find(|r| r.id == row_id)
    }

    pub fn row_mut(&mut self, row_id: &str) -> Option<&mut Row> {
        self.layout.rows.iter_mut().find(|r| r.id == row_id)
    }

    /// Resolve a cell by row and cell id.
    pub fn cell_mut(&mut self, row_id: &str, cell_id: &str) -> Option<&mut Cell> {
        self.row_mut(row_id)?
            .cells
            .iter_mut()
            .find(|c| c.id == cell_id)
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub rows: Vec<Row>,
}

// =============================================================================
// ROW
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub cells: Vec<Cell>,
}

impl Row {
    /// The canonical empty row: `COLUMN_COUNT` unoccupied cells of span 1.
    #[must_use]
    pub fn empty() -> Self {
        Self { id: Uuid::new_v4().to_string(), cells: (0..COLUMN_COUNT).map(|_| Cell::empty()).collect() }
    }

    /// Sum of `col_span` over the row's cells.
    #[must_use]
    pub fn span_total(&self) -> usize {
        self.cells.iter().map(|c| c.col_span).sum()
    }

    /// Whether the row spans exactly `COLUMN_COUNT` columns.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.span_total() == COLUMN_COUNT
    }

    /// A single cell covering every column.
    #[must_use]
    pub fn is_full_width(&self) -> bool {
        self.cells.len() == 1 && self.cells[0].col_span == COLUMN_COUNT
    }

    #[must_use]
    pub fn cell_index(&self, cell_id: &str) -> Option<usize> {
        self.cells.iter().position(|c| c.id == cell_id)
    }
}

// =============================================================================
// CELL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: String,
    #[serde(default)]
    pub component_id: Option<String>,
    pub col_span: usize,
}

impl Cell {
    /// An unoccupied cell of span 1.
    #[must_use]
    pub fn empty() -> Self {
        Self { id: Uuid::new_v4().to_string(), component_id: None, col_span: 1 }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.component_id.is_none()
    }
}

// =============================================================================
// COMPONENT
// =============================================================================

/// An instance of a registered content type placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    /// Content-type tag, resolved through the `ContentTypeRegistry`.
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Component {
    #[must_use]
    pub fn new(content_type: &str, properties: Properties) -> Self {
        Self { id: Uuid::new_v4().to_string(), content_type: content_type.to_owned(), properties }
    }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod tests;
