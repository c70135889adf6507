//! Backend seams shared by every store implementation.
//!
//! A backend is reached through three traits: [`Datastore`] manages the
//! connection and hands out collections, [`DocumentCollection`] carries the
//! document operations, and [`DocumentCursor`] walks a result set one document
//! at a time. Services and handlers only ever see these traits, so the wire
//! backend and the in-memory backend are interchangeable.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;
use cabinet_core::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Deadlines
// ============================================================================

/// Deadline for scans and anything that may touch many documents: find,
/// update and count calls.
pub const LONG_DEADLINE: Duration = Duration::from_secs(30);

/// Deadline for single-document writes and connection management: insert,
/// delete, connect and disconnect calls.
pub const SHORT_DEADLINE: Duration = Duration::from_secs(10);

/// Runs `fut` under `limit`, converting an elapsed timer into
/// [`Error::Timeout`] tagged with the operation name.
///
/// # Errors
///
/// Returns whatever `fut` returns, or [`Error::Timeout`] when the limit
/// elapses first.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::timeout(operation, limit.as_secs())),
    }
}

// ============================================================================
// Acknowledgements
// ============================================================================

/// Acknowledgement for a single-document insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertAck {
    /// Identity of the inserted document.
    pub inserted_id: ObjectId,
}

/// Acknowledgement for a batch insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertManyAck {
    /// Identities of the documents that were appended, in insertion order.
    pub inserted_ids: Vec<ObjectId>,
}

/// Acknowledgement for an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAck {
    /// Number of documents the filter matched.
    pub matched: u64,
    /// Number of documents actually rewritten.
    pub modified: u64,
}

// ============================================================================
// Traits
// ============================================================================

/// A connected (or connectable) document store.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Establishes the connection, verifying the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] when the backend cannot be reached and
    /// [`Error::InvalidOperation`] when the store is already connected.
    async fn connect(&self) -> Result<()>;

    /// Tears the connection down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the store is not connected.
    async fn disconnect(&self) -> Result<()>;

    /// Returns a handle to the named collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the backend does not know the
    /// collection.
    fn collection(&self, name: &str) -> Result<Arc<dyn DocumentCollection>>;
}

/// One named collection of BSON documents.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Name of the collection this handle points at.
    fn name(&self) -> &str;

    /// Appends one document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures, or
    /// [`Error::InvalidOperation`] when the backend cannot accept the
    /// document.
    async fn insert_one(&self, doc: Document) -> Result<InsertAck>;

    /// Appends a batch of documents.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`DocumentCollection::insert_one`].
    async fn insert_many(&self, docs: Vec<Document>) -> Result<InsertManyAck>;

    /// Returns the first document matching `filter`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn find_one(&self, filter: Document) -> Result<Option<Document>>;

    /// Returns a cursor over every document matching `filter`. An empty
    /// filter matches the whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn find(&self, filter: Document) -> Result<Box<dyn DocumentCursor>>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches and
    /// [`Error::Backend`] on wire failures.
    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateAck>;

    /// Applies `update` to the document with the given identity.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`DocumentCollection::update_one`].
    async fn update_by_id(&self, id: ObjectId, update: Document) -> Result<UpdateAck>;

    /// Removes the first document matching `filter` and returns it, or
    /// `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn find_one_and_delete(&self, filter: Document) -> Result<Option<Document>>;

    /// Removes the first document matching `filter`, returning the number of
    /// documents removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn delete_one(&self, filter: Document) -> Result<u64>;

    /// Removes every document matching `filter`, returning the number of
    /// documents removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn delete_many(&self, filter: Document) -> Result<u64>;

    /// Counts the documents matching `filter`. An empty filter counts the
    /// whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn count(&self, filter: Document) -> Result<u64>;
}

/// Forward-only walk over a result set.
///
/// The contract is strict: [`DocumentCursor::current`] is only valid after
/// [`DocumentCursor::advance`] has returned `true`, and reading past the end
/// fails with [`Error::Decode`] instead of handing back a sentinel document.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Moves to the next document. Returns `false` once the result set is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn advance(&mut self) -> Result<bool>;

    /// Returns the document the cursor is positioned on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the cursor is not positioned on a
    /// document.
    fn current(&self) -> Result<Document>;

    /// Releases the cursor. Further calls to `advance` return `false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on wire failures.
    async fn close(&mut self) -> Result<()>;
}

/// Drains `cursor` into a vector of documents, closing it afterwards.
///
/// # Errors
///
/// Propagates the first error the cursor reports.
pub async fn collect_documents(mut cursor: Box<dyn DocumentCursor>) -> Result<Vec<Document>> {
    let mut out = Vec::new();
    while cursor.advance().await? {
        out.push(cursor.current()?);
    }
    cursor.close().await?;
    Ok(out)
}
