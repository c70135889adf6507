//! MongoDB wire backend.
//!
//! A thin adapter from the backend seams onto the official driver. All
//! entity knowledge stays above this layer; the adapter only moves raw
//! documents, converts driver acknowledgements, and keeps cursor reads
//! within the contract the in-memory backend also honors.

use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use cabinet_core::{Error, Result};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::debug;

use crate::backend::{
    with_deadline, Datastore, DocumentCollection, DocumentCursor, InsertAck, InsertManyAck,
    UpdateAck, SHORT_DEADLINE,
};
use crate::config::StoreConfig;

fn driver_err(e: mongodb::error::Error) -> Error {
    Error::backend(e.to_string())
}

/// Datastore backed by a MongoDB deployment.
#[derive(Debug)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Builds a store from connection settings. No I/O happens here; the
    /// deployment is first reached on [`Datastore::connect`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unusable settings and
    /// [`Error::Backend`] when the uri does not parse.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let mut options = ClientOptions::parse(&config.uri).await.map_err(driver_err)?;
        options.app_name = config.app_name.clone();
        let client = Client::with_options(options).map_err(driver_err)?;
        let db = client.database(&config.database);
        Ok(MongoStore { client, db })
    }

    /// Name of the database this store serves.
    pub fn database_name(&self) -> &str {
        self.db.name()
    }
}

#[async_trait]
impl Datastore for MongoStore {
    async fn connect(&self) -> Result<()> {
        with_deadline("connect", SHORT_DEADLINE, async {
            self.db
                .run_command(doc! { "ping": 1 }, None)
                .await
                .map_err(driver_err)?;
            Ok(())
        })
        .await?;
        debug!(database = %self.db.name(), "wire store connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        with_deadline("disconnect", SHORT_DEADLINE, async {
            self.client.clone().shutdown().await;
            Ok(())
        })
        .await?;
        debug!(database = %self.db.name(), "wire store disconnected");
        Ok(())
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn DocumentCollection>> {
        Ok(Arc::new(MongoCollection {
            inner: self.db.collection::<Document>(name),
        }))
    }
}

/// One collection handle on the wire backend.
struct MongoCollection {
    inner: mongodb::Collection<Document>,
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn insert_one(&self, doc: Document) -> Result<InsertAck> {
        let outcome = self.inner.insert_one(doc, None).await.map_err(driver_err)?;
        let inserted_id = ack_object_id(outcome.inserted_id)?;
        Ok(InsertAck { inserted_id })
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<InsertManyAck> {
        let outcome = self
            .inner
            .insert_many(docs, None)
            .await
            .map_err(driver_err)?;
        let mut indexed: Vec<(usize, Bson)> = outcome.inserted_ids.into_iter().collect();
        indexed.sort_by_key(|(idx, _)| *idx);
        let mut inserted_ids = Vec::with_capacity(indexed.len());
        for (_, id) in indexed {
            inserted_ids.push(ack_object_id(id)?);
        }
        Ok(InsertManyAck { inserted_ids })
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        self.inner.find_one(filter, None).await.map_err(driver_err)
    }

    async fn find(&self, filter: Document) -> Result<Box<dyn DocumentCursor>> {
        let cursor = self.inner.find(filter, None).await.map_err(driver_err)?;
        Ok(Box::new(MongoCursor {
            inner: cursor,
            live: false,
            closed: false,
        }))
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateAck> {
        let outcome = self
            .inner
            .update_one(filter, update, None)
            .await
            .map_err(driver_err)?;
        if outcome.matched_count == 0 {
            return Err(Error::not_found(self.inner.name()));
        }
        Ok(UpdateAck {
            matched: outcome.matched_count,
            modified: outcome.modified_count,
        })
    }

    async fn update_by_id(&self, id: ObjectId, update: Document) -> Result<UpdateAck> {
        let outcome = self
            .inner
            .update_one(doc! { "_id": id }, update, None)
            .await
            .map_err(driver_err)?;
        if outcome.matched_count == 0 {
            return Err(Error::not_found(self.inner.name()));
        }
        Ok(UpdateAck {
            matched: outcome.matched_count,
            modified: outcome.modified_count,
        })
    }

    async fn find_one_and_delete(&self, filter: Document) -> Result<Option<Document>> {
        self.inner
            .find_one_and_delete(filter, None)
            .await
            .map_err(driver_err)
    }

    async fn delete_one(&self, filter: Document) -> Result<u64> {
        let outcome = self
            .inner
            .delete_one(filter, None)
            .await
            .map_err(driver_err)?;
        Ok(outcome.deleted_count)
    }

    async fn delete_many(&self, filter: Document) -> Result<u64> {
        let outcome = self
            .inner
            .delete_many(filter, None)
            .await
            .map_err(driver_err)?;
        Ok(outcome.deleted_count)
    }

    async fn count(&self, filter: Document) -> Result<u64> {
        self.inner
            .count_documents(filter, None)
            .await
            .map_err(driver_err)
    }
}

fn ack_object_id(id: Bson) -> Result<ObjectId> {
    id.as_object_id()
        .ok_or_else(|| Error::backend("insert acknowledgement did not carry an object id"))
}

/// Wire cursor wrapper that keeps reads inside the advance/current contract.
struct MongoCursor {
    inner: mongodb::Cursor<Document>,
    live: bool,
    closed: bool,
}

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn advance(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.live = self.inner.advance().await.map_err(driver_err)?;
        Ok(self.live)
    }

    fn current(&self) -> Result<Document> {
        if !self.live {
            return Err(Error::decode("cursor read past the end of its results"));
        }
        self.inner
            .deserialize_current()
            .map_err(|e| Error::decode(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        // The wire cursor itself is released when the wrapper drops.
        self.live = false;
        self.closed = true;
        Ok(())
    }
}
