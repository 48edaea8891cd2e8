//! Page layout grid engine.
//!
//! ARCHITECTURE
//! ============
//! Pages are rows of cells on a fixed four-column grid, with components
//! placed into cells. `grid` defines the document model, `registry` the
//! content types components are built from, and `state` the shared
//! editing state. `services` holds the mutation engine, the remote store
//! gateway, the write-through cache, and background sync.

pub mod config;
pub mod grid;
pub mod registry;
pub mod services;
pub mod state;
