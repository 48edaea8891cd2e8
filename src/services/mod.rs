//! Domain services behind the page editor.
//!
//! ARCHITECTURE
//! ============
//! `layout` holds the pure grid mutations. `editor` applies them to the
//! shared working copy, and `sync` runs the remote page actions. The
//! `gateway` and `cache` modules own the two stores, with `persistence`
//! providing the debounced writer the cache sits on.

pub mod cache;
pub mod editor;
pub mod gateway;
pub mod layout;
pub mod persistence;
pub mod sync;
