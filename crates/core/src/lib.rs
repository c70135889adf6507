//! Core types and traits for Cabinet
//!
//! This crate defines the foundation shared by every backend and service:
//! - Error: the error taxonomy for the whole access layer
//! - id: ObjectId helpers (the all-zero id is the unset sentinel)
//! - StoreRecord: the capability set every stored record type implements
//! - ErasedRecord: object-safe view of StoreRecord for decode registries
//! - models: the five entity shapes, each as a domain model plus a
//!   storage record

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod models;
pub mod record;

pub use error::{Error, Result};
pub use record::{decoder_for, Decoder, ErasedRecord, StoreRecord};

pub use models::account::{Account, AccountRecord};
pub use models::blacklist::{Blacklist, BlacklistRecord};
pub use models::file::{File, FileRecord, OwnerKind};
pub use models::group::{Group, GroupRecord};
pub use models::task::{Task, TaskRecord, TaskStatus};
pub use models::ValidationCase;
