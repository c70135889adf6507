//! Decoder registry for dynamic record handling
//!
//! The registry allows new record shapes to be registered without modifying
//! the in-memory backend or the store bootstrap.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = DecoderRegistry::new();
//!
//! // Register record shapes
//! registry.register::<AccountRecord>();
//! registry.register::<GroupRecord>();
//!
//! // Look up by collection name
//! let decode = registry.decoder("accounts").unwrap();
//! let record = decode(&document)?;
//!
//! // Check whether a collection is known
//! if !registry.is_registered("widgets") {
//!     warn!("Unknown collection");
//! }
//! ```

use std::collections::HashMap;

use bson::Document;
use cabinet_core::{
    decoder_for, AccountRecord, BlacklistRecord, Decoder, ErasedRecord, FileRecord, GroupRecord,
    Result, StoreRecord, TaskRecord,
};

/// Registry of record decoders keyed by collection name.
///
/// Maintains the mapping from collection name to the function that turns a
/// raw document of that collection into an erased record. This is how the
/// in-memory backend matches and updates documents without hardcoding the
/// record types it serves.
pub struct DecoderRegistry {
    /// Decoders by collection name.
    decoders: HashMap<String, Decoder>,
}

impl DecoderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        DecoderRegistry {
            decoders: HashMap::new(),
        }
    }

    /// Create a registry preloaded with every record shape the crate ships.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<AccountRecord>();
        registry.register::<GroupRecord>();
        registry.register::<TaskRecord>();
        registry.register::<BlacklistRecord>();
        registry.register::<FileRecord>();
        registry
    }

    /// Register a record shape under its collection name.
    ///
    /// Re-registering the same collection replaces the previous decoder.
    pub fn register<T: StoreRecord>(&mut self) {
        self.decoders.insert(T::COLLECTION.to_string(), decoder_for::<T>());
    }

    /// Get the decoder for a collection name.
    pub fn decoder(&self, collection: &str) -> Option<Decoder> {
        self.decoders.get(collection).copied()
    }

    /// Decode one document through the registered decoder for `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`cabinet_core::Error::InvalidOperation`] when the collection
    /// is not registered, or [`cabinet_core::Error::Decode`] when the
    /// document does not fit the registered shape.
    pub fn decode(&self, collection: &str, doc: &Document) -> Result<Box<dyn ErasedRecord>> {
        let decode = self.decoder(collection).ok_or_else(|| {
            cabinet_core::Error::invalid_operation(format!(
                "collection '{collection}' is not registered"
            ))
        })?;
        decode(doc)
    }

    /// Check if a collection is registered.
    pub fn is_registered(&self, collection: &str) -> bool {
        self.decoders.contains_key(collection)
    }

    /// Get all registered collection names, sorted.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.decoders.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered collections.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Unregister a collection, returning its decoder if it was present.
    pub fn unregister(&mut self, collection: &str) -> Option<Decoder> {
        self.decoders.remove(collection)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("collection_count", &self.decoders.len())
            .field("collections", &self.collections())
            .finish()
    }
}
