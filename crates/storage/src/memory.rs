//! Deterministic in-memory backend.
//!
//! Collections hold raw BSON documents behind an `RwLock` and route every
//! match, merge and identity question through the decoder registered for the
//! collection. Filter semantics therefore come from the record types
//! themselves, which keeps this backend's observable behavior aligned with
//! the wire backend without duplicating per-entity logic here.
//!
//! Identity rules are strict on purpose:
//! - inserts require a set identity, and re-inserting an identity that is
//!   already present leaves the stored document untouched
//! - updates and deletes resolve their target through the filter's identity,
//!   so a filter without one updates or deletes nothing

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;
use cabinet_core::{Decoder, Error, Result};
use parking_lot::RwLock;
use tracing::debug;

use crate::backend::{
    Datastore, DocumentCollection, DocumentCursor, InsertAck, InsertManyAck, UpdateAck,
};
use crate::registry::DecoderRegistry;

// ============================================================================
// Store
// ============================================================================

/// In-memory datastore: one [`MemoryCollection`] per registered record shape.
pub struct MemoryStore {
    connected: RwLock<bool>,
    collections: HashMap<String, Arc<MemoryCollection>>,
}

impl MemoryStore {
    /// Creates a store serving every record shape the crate ships.
    pub fn new() -> Self {
        Self::with_registry(&DecoderRegistry::with_defaults())
    }

    /// Creates a store serving exactly the collections in `registry`.
    pub fn with_registry(registry: &DecoderRegistry) -> Self {
        let mut collections = HashMap::new();
        for name in registry.collections() {
            if let Some(decode) = registry.decoder(&name) {
                collections.insert(name.clone(), Arc::new(MemoryCollection::new(name, decode)));
            }
        }
        MemoryStore {
            connected: RwLock::new(false),
            collections,
        }
    }

    /// True once [`Datastore::connect`] has succeeded and until
    /// [`Datastore::disconnect`].
    pub fn is_connected(&self) -> bool {
        *self.connected.read()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn connect(&self) -> Result<()> {
        let mut connected = self.connected.write();
        if *connected {
            return Err(Error::invalid_operation("datastore is already connected"));
        }
        *connected = true;
        debug!("memory store connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut connected = self.connected.write();
        if !*connected {
            return Err(Error::invalid_operation("datastore is not connected"));
        }
        *connected = false;
        debug!("memory store disconnected");
        Ok(())
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn DocumentCollection>> {
        self.collections
            .get(name)
            .cloned()
            .map(|collection| collection as Arc<dyn DocumentCollection>)
            .ok_or_else(|| {
                Error::invalid_operation(format!("collection '{name}' is not registered"))
            })
    }
}

// ============================================================================
// Collection
// ============================================================================

/// One in-memory collection of raw documents plus the decoder that gives
/// them meaning.
pub struct MemoryCollection {
    name: String,
    decode: Decoder,
    docs: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    fn new(name: String, decode: Decoder) -> Self {
        MemoryCollection {
            name,
            decode,
            docs: RwLock::new(Vec::new()),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// True when the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn require_identity(&self, doc: &Document) -> Result<ObjectId> {
        (self.decode)(doc)?.id().ok_or_else(|| {
            Error::invalid_operation(format!(
                "cannot insert a document without an identity into '{}'",
                self.name
            ))
        })
    }

    fn identity_of(&self, filter: &Document) -> Result<Option<ObjectId>> {
        Ok((self.decode)(filter)?.id())
    }

    fn position_of(&self, docs: &[Document], id: ObjectId) -> Result<Option<usize>> {
        for (idx, doc) in docs.iter().enumerate() {
            if (self.decode)(doc)?.id() == Some(id) {
                return Ok(Some(idx));
            }
        }
        Ok(None)
    }

    fn matching(&self, filter: &Document) -> Result<Vec<Document>> {
        let docs = self.docs.read();
        let mut out = Vec::new();
        for doc in docs.iter() {
            if filter.is_empty() || (self.decode)(doc)?.matches(filter) {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }

    fn apply_update(&self, id: ObjectId, update: &Document) -> Result<UpdateAck> {
        let fields = update_fields(update);
        let mut docs = self.docs.write();
        for slot in docs.iter_mut() {
            let mut record = (self.decode)(slot)?;
            if record.id() == Some(id) {
                record.apply_partial(&fields)?;
                *slot = record.to_document()?;
                debug!(collection = %self.name, %id, "memory update");
                return Ok(UpdateAck {
                    matched: 1,
                    modified: 1,
                });
            }
        }
        Err(Error::not_found(&self.name))
    }

    fn remove_by_filter(&self, filter: &Document) -> Result<Option<Document>> {
        let id = match self.identity_of(filter)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let mut docs = self.docs.write();
        match self.position_of(&docs, id)? {
            Some(idx) => {
                let doc = docs.remove(idx);
                debug!(collection = %self.name, %id, "memory delete");
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }
}

/// Unwraps a `$set` envelope; a bare field document is applied as-is.
fn update_fields(update: &Document) -> Document {
    match update.get_document("$set") {
        Ok(inner) => inner.clone(),
        Err(_) => update.clone(),
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, doc: Document) -> Result<InsertAck> {
        let id = self.require_identity(&doc)?;
        let mut docs = self.docs.write();
        if self.position_of(&docs, id)?.is_some() {
            debug!(collection = %self.name, %id, "memory insert skipped, identity already present");
        } else {
            docs.push(doc);
            debug!(collection = %self.name, %id, "memory insert");
        }
        Ok(InsertAck { inserted_id: id })
    }

    async fn insert_many(&self, batch: Vec<Document>) -> Result<InsertManyAck> {
        let mut inserted_ids = Vec::new();
        let mut docs = self.docs.write();
        for doc in batch {
            let id = self.require_identity(&doc)?;
            if self.position_of(&docs, id)?.is_none() {
                docs.push(doc);
                inserted_ids.push(id);
            }
        }
        Ok(InsertManyAck { inserted_ids })
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        let docs = self.docs.read();
        for doc in docs.iter() {
            if filter.is_empty() || (self.decode)(doc)?.matches(&filter) {
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn find(&self, filter: Document) -> Result<Box<dyn DocumentCursor>> {
        Ok(Box::new(MemoryCursor::new(self.matching(&filter)?)))
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateAck> {
        let id = self
            .identity_of(&filter)?
            .ok_or_else(|| Error::not_found(&self.name))?;
        self.apply_update(id, &update)
    }

    async fn update_by_id(&self, id: ObjectId, update: Document) -> Result<UpdateAck> {
        self.apply_update(id, &update)
    }

    async fn find_one_and_delete(&self, filter: Document) -> Result<Option<Document>> {
        self.remove_by_filter(&filter)
    }

    async fn delete_one(&self, filter: Document) -> Result<u64> {
        Ok(u64::from(self.remove_by_filter(&filter)?.is_some()))
    }

    async fn delete_many(&self, filter: Document) -> Result<u64> {
        // Identity resolution caps this at one document per call.
        Ok(u64::from(self.remove_by_filter(&filter)?.is_some()))
    }

    async fn count(&self, filter: Document) -> Result<u64> {
        Ok(self.matching(&filter)?.len() as u64)
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// Snapshot cursor over the documents that matched at `find` time.
struct MemoryCursor {
    docs: Vec<Document>,
    next: usize,
    current: Option<Document>,
}

impl MemoryCursor {
    fn new(docs: Vec<Document>) -> Self {
        MemoryCursor {
            docs,
            next: 0,
            current: None,
        }
    }
}

#[async_trait]
impl DocumentCursor for MemoryCursor {
    async fn advance(&mut self) -> Result<bool> {
        if self.next < self.docs.len() {
            self.current = Some(self.docs[self.next].clone());
            self.next += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn current(&self) -> Result<Document> {
        self.current
            .clone()
            .ok_or_else(|| Error::decode("cursor read past the end of its results"))
    }

    async fn close(&mut self) -> Result<()> {
        self.docs.clear();
        self.next = 0;
        self.current = None;
        Ok(())
    }
}
