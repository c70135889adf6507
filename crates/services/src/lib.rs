//! Service layer for Cabinet
//!
//! This crate holds everything above the backing store:
//! - `Repo<T>`: the generic handler implementing the CRUD surface for any
//!   record satisfying the capability set
//! - `Routine<T>` / `OpKind`: one handler operation as a dispatchable,
//!   resolvable unit of work, used for fanned-out lookups
//! - entity services (`GroupService`, `AccountService`, `TaskService`,
//!   `BlacklistService`, `FileService`): uniqueness pre-checks, concurrent
//!   referential validation and merge-update flows per entity
//! - `seed_root`: first-run seeding of the root group and admin account

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accounts;
pub mod blacklist;
pub mod bootstrap;
pub mod files;
pub mod groups;
pub mod handler;
pub mod routine;
pub mod tasks;

pub use accounts::{AccountService, ROLE_ADMIN, ROLE_MEMBER};
pub use blacklist::BlacklistService;
pub use bootstrap::{seed_root, BootstrapConfig};
pub use files::FileService;
pub use groups::GroupService;
pub use handler::Repo;
pub use routine::{OpKind, Routine};
pub use tasks::TaskService;
