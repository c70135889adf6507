//! Async routines: one handler operation as an independent unit of work.
//!
//! A [`Routine`] wraps a single [`Repo`] call so it can be dispatched onto
//! the runtime and resolved later. Each routine owns its outcome slot, so
//! fanned-out lookups can never attribute one lookup's error to another's
//! result. Callers dispatch every routine first, then resolve each one;
//! the decision step runs only after all outcomes are in.

use cabinet_core::{Error, Result, StoreRecord};
use tokio::task::JoinHandle;

use crate::handler::Repo;

/// The handler operation a routine executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// [`Repo::find_one`] with the routine's filter.
    FindOne,
    /// [`Repo::insert_one`] with the routine's payload.
    InsertOne,
    /// [`Repo::update_one`] with the routine's filter and payload.
    UpdateOne,
    /// [`Repo::delete_one`] with the routine's filter.
    DeleteOne,
}

/// One dispatchable, resolvable handler operation.
pub struct Routine<T: StoreRecord> {
    repo: Repo<T>,
    handle: Option<JoinHandle<Result<T>>>,
    outcome: Option<Result<T>>,
}

impl<T: StoreRecord> Routine<T> {
    /// Creates an idle routine over `repo`.
    pub fn new(repo: Repo<T>) -> Self {
        Routine {
            repo,
            handle: None,
            outcome: None,
        }
    }

    /// Spawns the operation onto the runtime. The call starts immediately;
    /// its outcome is collected by [`Routine::resolve`].
    ///
    /// `payload` is required for insert and update kinds and ignored for
    /// the others.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the routine is already
    /// in flight or resolved, or when a required payload is missing.
    pub fn dispatch(&mut self, kind: OpKind, filter: T, payload: Option<T>) -> Result<()> {
        if self.handle.is_some() || self.outcome.is_some() {
            return Err(Error::invalid_operation(
                "routine dispatched more than once",
            ));
        }
        let repo = self.repo.clone();
        let task = match kind {
            OpKind::FindOne => tokio::spawn(async move { repo.find_one(&filter).await }),
            OpKind::DeleteOne => tokio::spawn(async move { repo.delete_one(&filter).await }),
            OpKind::InsertOne => {
                let payload = require_payload(kind, payload)?;
                tokio::spawn(async move { repo.insert_one(payload).await })
            }
            OpKind::UpdateOne => {
                let payload = require_payload(kind, payload)?;
                tokio::spawn(async move { repo.update_one(&filter, payload).await })
            }
        };
        self.handle = Some(task);
        Ok(())
    }

    /// Joins the spawned operation and stores its outcome for inspection.
    ///
    /// Resolving an undispatched routine stores an
    /// [`Error::InvalidOperation`] outcome; a panicked task is stored as
    /// [`Error::Backend`]. Resolving twice keeps the first outcome.
    pub async fn resolve(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(Error::backend(format!(
                    "routine task failed: {join_err}"
                ))),
            },
            None => Err(Error::invalid_operation(
                "routine resolved before dispatch",
            )),
        });
    }

    /// The successful result, if the routine resolved with one.
    pub fn result(&self) -> Option<&T> {
        match &self.outcome {
            Some(Ok(record)) => Some(record),
            _ => None,
        }
    }

    /// The error, if the routine resolved with one.
    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    /// Consumes the routine, yielding its outcome.
    ///
    /// # Errors
    ///
    /// Returns the stored operation error, or
    /// [`Error::InvalidOperation`] when the routine was never resolved.
    pub fn into_outcome(self) -> Result<T> {
        self.outcome
            .unwrap_or_else(|| Err(Error::invalid_operation("routine was never resolved")))
    }
}

fn require_payload<T>(kind: OpKind, payload: Option<T>) -> Result<T> {
    payload.ok_or_else(|| Error::invalid_operation(format!("{kind:?} requires a payload")))
}
