//! Storage layer for Cabinet
//!
//! This crate implements the backing store abstraction with:
//! - `Datastore` / `DocumentCollection` / `DocumentCursor`: the seams every
//!   backend implements
//! - `MongoStore`: thin adapter over the MongoDB driver
//! - `MemoryStore`: deterministic in-memory backend for tests and local runs
//! - `DecoderRegistry`: collection-name to record-decoder mapping that keeps
//!   the in-memory backend free of per-entity branching
//! - `StoreConfig`: connection settings loaded from a JSON file
//!
//! # Backend parity
//!
//! Both backends speak BSON documents at the seam. The in-memory backend
//! resolves matching and updates through the decoded records themselves, so a
//! service exercised against it observes the same outcomes it would observe
//! against the wire backend.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod memory;
pub mod mongo;
pub mod registry;

pub use backend::{
    collect_documents, with_deadline, Datastore, DocumentCollection, DocumentCursor, InsertAck,
    InsertManyAck, UpdateAck, LONG_DEADLINE, SHORT_DEADLINE,
};
pub use config::StoreConfig;
pub use memory::{MemoryCollection, MemoryStore};
pub use mongo::MongoStore;
pub use registry::DecoderRegistry;
