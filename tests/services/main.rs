//! Service Flows Test Suite
//!
//! End-to-end flows through the entity services against the in-memory
//! backend: create/read/update/delete chains across groups, accounts, tasks,
//! blacklist markers and file metadata, the concurrent referential checks
//! and their fixed error precedence, and first-run seeding.
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test service_flows
//!
//! # Run one module
//! cargo test --test service_flows referential::
//! ```

#[path = "../common/mod.rs"]
mod common;

mod crud_flows;
mod referential;
mod seeding;
