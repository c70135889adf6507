//! Cabinet - capability-based access layer for document stores
//!
//! Cabinet persists heterogeneous record types through one generic handler,
//! backed interchangeably by a MongoDB deployment and a deterministic
//! in-memory store with the same observable semantics.
//!
//! # Quick Start
//!
//! ```ignore
//! use cabinet::{Datastore, Group, GroupService, MemoryStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn Datastore> = Arc::new(MemoryStore::new());
//! let groups = GroupService::new(&store)?;
//!
//! let engineering = groups
//!     .create(&Group { name: "engineering".into(), ..Group::default() })
//!     .await?;
//! ```
//!
//! # Architecture
//!
//! Record types implement the [`StoreRecord`] capability set; [`Repo`] runs
//! the CRUD surface over any of them against a [`Datastore`]; the entity
//! services layer uniqueness checks, concurrent referential validation and
//! bootstrap seeding on top. Entity knowledge lives entirely in the record
//! implementations, never in the handler or the backends.

// Core: errors, identity, capability set, entity shapes
pub use cabinet_core::{
    Account, AccountRecord, Blacklist, BlacklistRecord, Decoder, ErasedRecord, Error, File,
    FileRecord, Group, GroupRecord, OwnerKind, Result, StoreRecord, Task, TaskRecord, TaskStatus,
    ValidationCase,
};

// Storage: backend seams and both implementations
pub use cabinet_storage::{
    collect_documents, with_deadline, Datastore, DecoderRegistry, DocumentCollection,
    DocumentCursor, InsertAck, InsertManyAck, MemoryCollection, MemoryStore, MongoStore,
    StoreConfig, UpdateAck, LONG_DEADLINE, SHORT_DEADLINE,
};

// Services: generic handler, routines, entity services, bootstrap
pub use cabinet_services::{
    seed_root, AccountService, BlacklistService, BootstrapConfig, FileService, GroupService,
    OpKind, Repo, Routine, TaskService, ROLE_ADMIN, ROLE_MEMBER,
};
