//! Group entity: the membership scope accounts and tasks hang off.

use crate::error::{Error, Result};
use crate::id;
use crate::models::{
    is_false, missing_fields, nonempty, opt_string, to_bson_time, to_chrono_time, ValidationCase,
};
use crate::record::StoreRecord;
use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Identity as 24-char hex; empty or all-zero means unset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Unique group name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// True only for the bootstrap-seeded root group.
    #[serde(default, skip_serializing_if = "is_false")]
    pub root_admin: bool,
    /// Last write, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// First write, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Soft-delete marker, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Group {
    /// True when `id` parses to a set identity.
    pub fn has_id(&self) -> bool {
        id::is_valid_ref(&self.id)
    }

    /// Checks the fields required for a validation scenario.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing the missing fields, or for an
    /// unsupported scenario.
    pub fn validate(&self, case: ValidationCase) -> Result<()> {
        let mut missing = Vec::new();
        match case {
            ValidationCase::Create => {
                if self.name.is_empty() {
                    missing.push("name");
                }
            }
            ValidationCase::Update => {
                if !self.has_id() {
                    missing.push("id");
                }
            }
            ValidationCase::Auth | ValidationCase::Retrieve => {
                return Err(Error::validation("unrecognized validation case"))
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing_fields("group", &missing))
        }
    }

    /// Fills each unset field from the currently stored group before an
    /// update is applied.
    pub fn merge_existing(&mut self, current: &Group) {
        if self.name.is_empty() {
            self.name = current.name.clone();
        }
    }
}

/// Storage-side group document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Identity; unset ids are omitted from the transport form.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// True only for the bootstrap-seeded root group.
    #[serde(default, skip_serializing_if = "is_false")]
    pub root_admin: bool,
    /// Last write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<bson::DateTime>,
    /// First write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<bson::DateTime>,
    /// Soft-delete marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<bson::DateTime>,
}

impl GroupRecord {
    /// Builds a storage record from a domain group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSelector`] when the id string is not
    /// valid hex.
    pub fn from_domain(group: &Group) -> Result<Self> {
        Ok(GroupRecord {
            id: id::parse(&group.id)?,
            name: opt_string(&group.name),
            root_admin: group.root_admin,
            last_modified: to_bson_time(group.last_modified),
            created_at: to_bson_time(group.created_at),
            deleted_at: to_bson_time(group.deleted_at),
        })
    }

    /// Renders the record back into a domain group.
    pub fn to_domain(&self) -> Group {
        Group {
            id: id::hex(self.id),
            name: self.name.clone().unwrap_or_default(),
            root_admin: self.root_admin,
            last_modified: to_chrono_time(self.last_modified),
            created_at: to_chrono_time(self.created_at),
            deleted_at: to_chrono_time(self.deleted_at),
        }
    }
}

impl StoreRecord for GroupRecord {
    const COLLECTION: &'static str = "groups";

    fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    fn to_filter(&self) -> Result<Document> {
        if let Some(v) = id::set(self.id) {
            Ok(doc! { "_id": v })
        } else if let Some(v) = nonempty(&self.name) {
            Ok(doc! { "name": v })
        } else {
            Ok(Document::new())
        }
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(bson::from_document(doc.clone())?)
    }

    fn apply_partial(&mut self, doc: &Document) -> Result<()> {
        let incoming = Self::from_document(doc)?;
        if nonempty(&incoming.name).is_some() {
            self.name = incoming.name;
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
        if nonempty(&self.name).is_none() {
            return Err(Error::validation("group record does not have a name"));
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
        if let Some(v) = nonempty(&f.name) {
            return self.name.as_deref() == Some(v);
        }
        false
    }
}
