//! Blacklist entity: revoked-token markers.
//!
//! A token is revoked when a marker document carrying it exists; lookups by
//! token answer the revocation question. Token issuance and verification
//! live outside this layer.

use crate::error::{Error, Result};
use crate::id;
use crate::models::{nonempty, opt_string, to_bson_time, to_chrono_time};
use crate::record::StoreRecord;
use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain blacklist marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blacklist {
    /// Identity as 24-char hex; empty or all-zero means unset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// The revoked token, stored verbatim.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_token: String,
    /// Last write, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// First write, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Storage-side blacklist document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlacklistRecord {
    /// Identity; unset ids are omitted from the transport form.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// The revoked token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Last write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<bson::DateTime>,
    /// First write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<bson::DateTime>,
}

impl BlacklistRecord {
    /// Builds a storage record from a domain marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSelector`] when the id string is not
    /// valid hex.
    pub fn from_domain(blacklist: &Blacklist) -> Result<Self> {
        Ok(BlacklistRecord {
            id: id::parse(&blacklist.id)?,
            auth_token: opt_string(&blacklist.auth_token),
            last_modified: to_bson_time(blacklist.last_modified),
            created_at: to_bson_time(blacklist.created_at),
        })
    }

    /// Renders the record back into a domain marker.
    pub fn to_domain(&self) -> Blacklist {
        Blacklist {
            id: id::hex(self.id),
            auth_token: self.auth_token.clone().unwrap_or_default(),
            last_modified: to_chrono_time(self.last_modified),
            created_at: to_chrono_time(self.created_at),
        }
    }
}

impl StoreRecord for BlacklistRecord {
    const COLLECTION: &'static str = "blacklists";

    fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    // Revocation checks always come in by token, so the token outranks
    // the identity here.
    fn to_filter(&self) -> Result<Document> {
        if let Some(v) = nonempty(&self.auth_token) {
            Ok(doc! { "auth_token": v })
        } else if let Some(v) = id::set(self.id) {
            Ok(doc! { "_id": v })
        } else {
            Ok(Document::new())
        }
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(bson::from_document(doc.clone())?)
    }

    fn apply_partial(&mut self, doc: &Document) -> Result<()> {
        let incoming = Self::from_document(doc)?;
        if nonempty(&incoming.auth_token).is_some() {
            self.auth_token = incoming.auth_token;
        }
        if incoming.last_modified.is_some() {
            self.last_modified = incoming.last_modified;
        }
        Ok(())
    }

    fn stamp(&mut self, new_record: bool) {
        let now = bson::DateTime::now();
        self.last_modified = Some(now);
        if new_record {
            self.created_at = Some(now);
        }
    }

    fn assign_id(&mut self) {
        if id::set(self.id).is_none() {
            self.id = Some(ObjectId::new());
        }
    }

    fn post_validate(&self) -> Result<()> {
        if nonempty(&self.auth_token).is_none() {
            return Err(Error::validation(
                "blacklist record does not have an auth token",
            ));
        }
        Ok(())
    }

    fn id(&self) -> Option<ObjectId> {
        id::set(self.id)
    }

    fn matches(&self, filter: &Document) -> bool {
        let f = match Self::from_document(filter) {
            Ok(f) => f,
            Err(_) => return false,
        };
        if let Some(v) = id::set(f.id) {
            return StoreRecord::id(self) == Some(v);
        }
        if let Some(v) = nonempty(&f.auth_token) {
            return self.auth_token.as_deref() == Some(v);
        }
        false
    }
}
