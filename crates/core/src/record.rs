//! The record capability set.
//!
//! Every stored record type implements [`StoreRecord`]: one bundle of
//! capabilities that lets a single generic handler perform the full CRUD
//! surface over any entity, and lets the in-memory backend scan, match and
//! merge documents without knowing concrete types ([`ErasedRecord`]).

use crate::error::Result;
use bson::oid::ObjectId;
use bson::{doc, Document};

/// Capability set implemented by each stored record type.
///
/// A `StoreRecord` is the storage-side shape of an entity: ObjectId
/// references, store-native timestamps, and unset fields omitted from its
/// transport form. The handler drives records exclusively through this
/// trait.
pub trait StoreRecord: std::fmt::Debug + Clone + Send + Sync + Sized + 'static {
    /// Name of the collection this record type lives in.
    const COLLECTION: &'static str;

    /// Serializes the record into its transport document. Unset fields are
    /// omitted, which is what makes update documents non-destructive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if encoding fails.
    fn to_document(&self) -> Result<Document>;

    /// Derives a filter document from the first populated selector field,
    /// in this record type's priority order. Yields an empty document when
    /// no selector field is populated; the caller decides whether that is
    /// legal for the operation at hand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if encoding fails.
    fn to_filter(&self) -> Result<Document>;

    /// Builds the update document for this record.
    ///
    /// The default wraps [`to_document`](Self::to_document) in a `$set`, so
    /// only populated fields reach the store and everything else is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if encoding fails.
    fn to_update(&self) -> Result<Document> {
        Ok(doc! { "$set": self.to_document()? })
    }

    /// Decodes a stored document into a record.
    ///
    /// Partial documents are legal: absent fields decode to their unset
    /// state. This is what filter documents rely on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if the document does
    /// not deserialize into this shape.
    fn from_document(doc: &Document) -> Result<Self>;

    /// Merges the populated fields of `doc` into this record. Fields absent
    /// from `doc` keep their current value; a partial update can never
    /// clear data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if `doc` does not
    /// decode into this shape.
    fn apply_partial(&mut self, doc: &Document) -> Result<()>;

    /// Stamps modification metadata in UTC. `last_modified` is always set
    /// to now; `created_at` only when `new_record` is true, from the same
    /// instant, so `last_modified >= created_at` holds for every stored
    /// record.
    fn stamp(&mut self, new_record: bool);

    /// Generates an identity when the record has none. Set ids are never
    /// overwritten.
    fn assign_id(&mut self);

    /// Checks required fields after a load or write. The required field is
    /// per-entity (an email, a name, a reference).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) naming the
    /// missing field.
    fn post_validate(&self) -> Result<()>;

    /// The record's identity; unset (absent or all-zero) ids are `None`.
    fn id(&self) -> Option<ObjectId>;

    /// Filter test used by the in-memory backend: the first populated
    /// selector field of `filter` (in this type's match priority) decides,
    /// and a filter that fails to decode matches nothing.
    fn matches(&self, filter: &Document) -> bool;
}

/// Object-safe view of [`StoreRecord`] used by decode registries.
///
/// The in-memory backend stores raw documents and works on them through
/// boxed erased records, so it never names a concrete entity type.
pub trait ErasedRecord: std::fmt::Debug + Send {
    /// The record's identity; unset ids are `None`.
    fn id(&self) -> Option<ObjectId>;
    /// Filter test, as in [`StoreRecord::matches`].
    fn matches(&self, filter: &Document) -> bool;
    /// Partial merge, as in [`StoreRecord::apply_partial`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if the document does
    /// not decode into the underlying shape.
    fn apply_partial(&mut self, doc: &Document) -> Result<()>;
    /// Re-encode, as in [`StoreRecord::to_document`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if encoding fails.
    fn to_document(&self) -> Result<Document>;
}

impl<T: StoreRecord> ErasedRecord for T {
    fn id(&self) -> Option<ObjectId> {
        StoreRecord::id(self)
    }

    fn matches(&self, filter: &Document) -> bool {
        StoreRecord::matches(self, filter)
    }

    fn apply_partial(&mut self, doc: &Document) -> Result<()> {
        StoreRecord::apply_partial(self, doc)
    }

    fn to_document(&self) -> Result<Document> {
        StoreRecord::to_document(self)
    }
}

/// Decode function stored in a registry: raw document in, erased record out.
pub type Decoder = fn(&Document) -> Result<Box<dyn ErasedRecord>>;

/// The registry decoder for a concrete record type.
pub fn decoder_for<T: StoreRecord>() -> Decoder {
    decode_erased::<T>
}

fn decode_erased<T: StoreRecord>(doc: &Document) -> Result<Box<dyn ErasedRecord>> {
    Ok(Box::new(T::from_document(doc)?))
}
