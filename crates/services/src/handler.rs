//! The generic handler.
//!
//! [`Repo<T>`] is one type-parameterized component implementing the whole
//! CRUD surface for any record satisfying the capability set. It owns a
//! collection handle, derives selector and update documents through the
//! record itself, and caps every store call with a per-operation deadline.
//! There is no per-entity branching here; entity behavior lives entirely in
//! the `StoreRecord` implementations.

use std::marker::PhantomData;
use std::sync::Arc;

use bson::Document;
use cabinet_core::{Error, Result, StoreRecord};
use cabinet_storage::{
    with_deadline, Datastore, DocumentCollection, LONG_DEADLINE, SHORT_DEADLINE,
};
use tracing::debug;

/// Typed repository over one collection of a datastore.
///
/// Cloning is cheap (the collection handle is shared), which is what lets
/// routines spawn handler calls onto the runtime.
pub struct Repo<T: StoreRecord> {
    collection: Arc<dyn DocumentCollection>,
    _record: PhantomData<fn() -> T>,
}

impl<T: StoreRecord> Clone for Repo<T> {
    fn clone(&self) -> Self {
        Repo {
            collection: Arc::clone(&self.collection),
            _record: PhantomData,
        }
    }
}

impl<T: StoreRecord> Repo<T> {
    /// Binds a repository to `T`'s collection on the given store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the store does not serve the
    /// collection.
    pub fn new(store: &Arc<dyn Datastore>) -> Result<Self> {
        Ok(Repo {
            collection: store.collection(T::COLLECTION)?,
            _record: PhantomData,
        })
    }

    /// Name of the collection this repository operates on.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Selector for operations that must address specific documents.
    fn required_selector(&self, filter: &T) -> Result<Document> {
        let selector = filter.to_filter()?;
        if selector.is_empty() {
            return Err(Error::malformed_selector(format!(
                "no usable filter field populated for '{}'",
                T::COLLECTION
            )));
        }
        Ok(selector)
    }

    /// Fetches the single record matching `filter`.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedSelector`] when no selector field is populated,
    /// [`Error::NotFound`] when nothing matches, [`Error::Validation`] when
    /// the stored record fails post-validation.
    pub async fn find_one(&self, filter: &T) -> Result<T> {
        let selector = self.required_selector(filter)?;
        debug!(collection = T::COLLECTION, "find_one");
        let found = with_deadline(
            "find_one",
            LONG_DEADLINE,
            self.collection.find_one(selector),
        )
        .await?
        .ok_or_else(|| Error::not_found(T::COLLECTION))?;
        let record = T::from_document(&found)?;
        record.post_validate()?;
        Ok(record)
    }

    /// Fetches every record matching `filter`, in stored order. An empty
    /// selector is legal here and matches the whole collection.
    ///
    /// Validation is fail-fast: the first stored record that fails
    /// [`StoreRecord::post_validate`] aborts the whole call.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] on the first invalid record, [`Error::Decode`]
    /// on an undecodable document.
    pub async fn find_many(&self, filter: &T) -> Result<Vec<T>> {
        let selector = filter.to_filter()?;
        debug!(collection = T::COLLECTION, "find_many");
        with_deadline("find_many", LONG_DEADLINE, async {
            let mut cursor = self.collection.find(selector).await?;
            let mut records = Vec::new();
            while cursor.advance().await? {
                let record = T::from_document(&cursor.current()?)?;
                record.post_validate()?;
                records.push(record);
            }
            cursor.close().await?;
            Ok(records)
        })
        .await
    }

    /// Stamps, assigns identity and inserts `record`, returning the stored
    /// copy.
    ///
    /// Validation runs on the stamped input after the write, not on a
    /// re-read of the stored value.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when the record fails post-validation, plus
    /// store-level failures.
    pub async fn insert_one(&self, mut record: T) -> Result<T> {
        record.stamp(true);
        record.assign_id();
        let doc = record.to_document()?;
        debug!(collection = T::COLLECTION, "insert_one");
        with_deadline(
            "insert_one",
            SHORT_DEADLINE,
            self.collection.insert_one(doc),
        )
        .await?;
        record.post_validate()?;
        Ok(record)
    }

    /// Applies `payload` as a partial update to the record matching
    /// `filter`, returning the stamped payload.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedSelector`] when no selector field is populated,
    /// [`Error::NotFound`] when nothing matches, [`Error::Validation`] when
    /// the payload fails post-validation.
    pub async fn update_one(&self, filter: &T, mut payload: T) -> Result<T> {
        let selector = self.required_selector(filter)?;
        payload.stamp(false);
        let update = payload.to_update()?;
        debug!(collection = T::COLLECTION, "update_one");
        with_deadline(
            "update_one",
            LONG_DEADLINE,
            self.collection.update_one(selector, update),
        )
        .await?;
        payload.post_validate()?;
        Ok(payload)
    }

    /// Removes the record matching `filter` and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedSelector`] when no selector field is populated,
    /// [`Error::NotFound`] when nothing matches.
    pub async fn delete_one(&self, filter: &T) -> Result<T> {
        let selector = self.required_selector(filter)?;
        debug!(collection = T::COLLECTION, "delete_one");
        let removed = with_deadline(
            "delete_one",
            SHORT_DEADLINE,
            self.collection.find_one_and_delete(selector),
        )
        .await?
        .ok_or_else(|| Error::not_found(T::COLLECTION))?;
        T::from_document(&removed)
    }

    /// Removes every record matching `filter`, returning the removed count.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedSelector`] when no selector field is populated.
    pub async fn delete_many(&self, filter: &T) -> Result<u64> {
        let selector = self.required_selector(filter)?;
        debug!(collection = T::COLLECTION, "delete_many");
        with_deadline(
            "delete_many",
            SHORT_DEADLINE,
            self.collection.delete_many(selector),
        )
        .await
    }

    /// Counts the records matching `filter`. An empty selector counts the
    /// whole collection.
    pub async fn count(&self, filter: &T) -> Result<u64> {
        let selector = filter.to_filter()?;
        with_deadline("count", LONG_DEADLINE, self.collection.count(selector)).await
    }
}
