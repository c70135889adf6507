//! Storage Semantics Test Suite
//!
//! Exercises the backend contract through the public surface: record-driven
//! filter matching across collections, non-destructive update merges,
//! consistency under concurrent access, and the generic handler's ordering
//! and failure mapping on top of the store.
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test storage_semantics
//!
//! # Run one module
//! cargo test --test storage_semantics handler::
//! ```

#[path = "../common/mod.rs"]
mod common;

mod handler;
mod store;
