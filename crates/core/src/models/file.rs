//! File entity: metadata for externally stored blobs.
//!
//! Only metadata lives here; the bytes sit in an external blob store and
//! are referenced by `blob_id`. A file is owned by either an account or a
//! group, and its bucket name is derived from that owner.

use crate::error::{Error, Result};
use crate::id;
use crate::models::{
    missing_fields, nonempty, opt_string, to_bson_time, to_chrono_time, ValidationCase,
};
use crate::record::StoreRecord;
use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which entity owns a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// Owned by a single account.
    Account,
    /// Shared by a group.
    Group,
}

impl OwnerKind {
    /// The wire encoding of the owner kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Account => "account",
            OwnerKind::Group => "group",
        }
    }
}

/// Domain file metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
    /// Identity as 24-char hex; empty or all-zero means unset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Owning account or group reference, hex.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner_id: String,
    /// Whether the owner is an account or a group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_kind: Option<OwnerKind>,
    /// External blob reference, hex.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub blob_id: String,
    /// Blob-store bucket, derived from the owner.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bucket: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Content type.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Blob size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
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

impl File {
    /// True when `id` parses to a set identity.
    pub fn has_id(&self) -> bool {
        id::is_valid_ref(&self.id)
    }

    /// True when `owner_id` parses to a set identity.
    pub fn has_owner_id(&self) -> bool {
        id::is_valid_ref(&self.owner_id)
    }

    /// True when `blob_id` parses to a set identity.
    pub fn has_blob_id(&self) -> bool {
        id::is_valid_ref(&self.blob_id)
    }

    /// Derives the bucket name from the owner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the owner reference or kind is
    /// unset.
    pub fn build_bucket(&mut self) -> Result<()> {
        match self.owner_kind {
            Some(kind) if self.has_owner_id() => {
                self.bucket = format!("{}_{}_bucket", kind.as_str(), self.owner_id);
                Ok(())
            }
            _ => Err(Error::validation("file is missing an owner")),
        }
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
                if !self.has_owner_id() {
                    missing.push("owner_id");
                }
                if self.owner_kind.is_none() {
                    missing.push("owner_kind");
                }
                if self.name.is_empty() {
                    missing.push("name");
                }
                if self.kind.is_empty() {
                    missing.push("kind");
                }
            }
            ValidationCase::Update => {
                if !self.has_id() {
                    missing.push("id");
                }
            }
            ValidationCase::Retrieve => {
                if !self.has_id() && !self.has_owner_id() && !self.has_blob_id() {
                    missing.push("id");
                }
            }
            ValidationCase::Auth => {
                return Err(Error::validation("unrecognized validation case"))
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing_fields("file", &missing))
        }
    }

    /// Minimal lookup filter for modification requests: identity, else
    /// owner, else blob reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSelector`] when none is usable.
    pub fn build_filter(&self) -> Result<File> {
        let mut filter = File::default();
        if self.has_id() {
            filter.id = self.id.clone();
        } else if self.has_owner_id() {
            filter.owner_id = self.owner_id.clone();
        } else if self.has_blob_id() {
            filter.blob_id = self.blob_id.clone();
        } else {
            return Err(Error::malformed_selector(
                "file is missing a valid query filter",
            ));
        }
        Ok(filter)
    }

    /// Fills each unset field from the currently stored file before an
    /// update is applied. When the incoming update carries a complete new
    /// owner the bucket name is rebuilt; otherwise the stored bucket is
    /// kept.
    pub fn merge_existing(&mut self, current: &File) {
        let mut inherited_owner = false;
        if self.owner_id.is_empty() {
            self.owner_id = current.owner_id.clone();
            inherited_owner = true;
        }
        if self.owner_kind.is_none() {
            self.owner_kind = current.owner_kind;
            inherited_owner = true;
        }
        if self.name.is_empty() {
            self.name = current.name.clone();
        }
        if self.kind.is_empty() {
            self.kind = current.kind.clone();
        }
        if inherited_owner {
            self.bucket = current.bucket.clone();
        } else {
            let _ = self.build_bucket();
        }
    }
}

/// Storage-side file document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Identity; unset ids are omitted from the transport form.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Owning account or group reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<ObjectId>,
    /// Whether the owner is an account or a group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_kind: Option<OwnerKind>,
    /// External blob reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_id: Option<ObjectId>,
    /// Blob-store bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Blob size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
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

impl FileRecord {
    /// Builds a storage record from domain file metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSelector`] when a reference string is not
    /// valid hex.
    pub fn from_domain(file: &File) -> Result<Self> {
        Ok(FileRecord {
            id: id::parse(&file.id)?,
            owner_id: id::parse(&file.owner_id)?,
            owner_kind: file.owner_kind,
            blob_id: id::parse(&file.blob_id)?,
            bucket: opt_string(&file.bucket),
            name: opt_string(&file.name),
            kind: opt_string(&file.kind),
            size: file.size.filter(|v| *v > 0),
            last_modified: to_bson_time(file.last_modified),
            created_at: to_bson_time(file.created_at),
            deleted_at: to_bson_time(file.deleted_at),
        })
    }

    /// Renders the record back into domain file metadata.
    pub fn to_domain(&self) -> File {
        File {
            id: id::hex(self.id),
            owner_id: id::hex(self.owner_id),
            owner_kind: self.owner_kind,
            blob_id: id::hex(self.blob_id),
            bucket: self.bucket.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            kind: self.kind.clone().unwrap_or_default(),
            size: self.size,
            last_modified: to_chrono_time(self.last_modified),
            created_at: to_chrono_time(self.created_at),
            deleted_at: to_chrono_time(self.deleted_at),
        }
    }
}

impl StoreRecord for FileRecord {
    const COLLECTION: &'static str = "files";

    fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    fn to_filter(&self) -> Result<Document> {
        if let Some(v) = id::set(self.id) {
            Ok(doc! { "_id": v })
        } else if let Some(v) = id::set(self.owner_id) {
            Ok(doc! { "owner_id": v })
        } else if let Some(v) = id::set(self.blob_id) {
            Ok(doc! { "blob_id": v })
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
        if nonempty(&incoming.bucket).is_some() {
            self.bucket = incoming.bucket;
        }
        if nonempty(&incoming.kind).is_some() {
            self.kind = incoming.kind;
        }
        if incoming.owner_kind.is_some() {
            self.owner_kind = incoming.owner_kind;
        }
        if incoming.size.filter(|v| *v > 0).is_some() {
            self.size = incoming.size;
        }
        if let Some(v) = id::set(incoming.owner_id) {
            self.owner_id = Some(v);
        }
        if let Some(v) = id::set(incoming.blob_id) {
            self.blob_id = Some(v);
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
        if id::set(self.blob_id).is_none() {
            return Err(Error::validation(
                "file record does not have a blob reference",
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
        if let Some(v) = id::set(f.owner_id) {
            return id::set(self.owner_id) == Some(v);
        }
        if let Some(v) = id::set(f.blob_id) {
            return id::set(self.blob_id) == Some(v);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> File {
        File {
            owner_id: ObjectId::new().to_hex(),
            owner_kind: Some(OwnerKind::Group),
            name: "report.pdf".into(),
            kind: "application/pdf".into(),
            ..File::default()
        }
    }

    #[test]
    fn owner_kind_wire_encoding() {
        assert_eq!(
            serde_json::to_string(&OwnerKind::Account).unwrap(),
            "\"account\""
        );
        let back: OwnerKind = serde_json::from_str("\"group\"").unwrap();
        assert_eq!(back, OwnerKind::Group);
    }

    #[test]
    fn bucket_derives_from_owner() {
        let mut file = sample();
        file.build_bucket().unwrap();
        assert_eq!(file.bucket, format!("group_{}_bucket", file.owner_id));
        let mut orphan = File::default();
        assert!(orphan.build_bucket().is_err());
    }

    #[test]
    fn validate_create_requires_owner_and_name() {
        let err = File::default().validate(ValidationCase::Create).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("owner_id"));
        assert!(msg.contains("owner_kind"));
        assert!(msg.contains("name"));
        assert!(msg.contains("kind"));
        assert!(sample().validate(ValidationCase::Create).is_ok());
    }

    #[test]
    fn validate_retrieve_accepts_any_reference() {
        assert!(File::default().validate(ValidationCase::Retrieve).is_err());
        let by_blob = File {
            blob_id: ObjectId::new().to_hex(),
            ..File::default()
        };
        assert!(by_blob.validate(ValidationCase::Retrieve).is_ok());
    }

    #[test]
    fn build_filter_priority() {
        let full = File {
            id: ObjectId::new().to_hex(),
            owner_id: ObjectId::new().to_hex(),
            blob_id: ObjectId::new().to_hex(),
            ..File::default()
        };
        assert_eq!(full.build_filter().unwrap().id, full.id);
        let no_id = File {
            owner_id: full.owner_id.clone(),
            blob_id: full.blob_id.clone(),
            ..File::default()
        };
        assert_eq!(no_id.build_filter().unwrap().owner_id, full.owner_id);
        assert!(File::default().build_filter().is_err());
    }

    #[test]
    fn merge_existing_rebuilds_bucket_only_for_new_owner() {
        let mut current = sample();
        current.build_bucket().unwrap();

        // partial update without owner fields keeps the stored bucket
        let mut rename = File {
            name: "renamed.pdf".into(),
            ..File::default()
        };
        rename.merge_existing(&current);
        assert_eq!(rename.bucket, current.bucket);
        assert_eq!(rename.owner_id, current.owner_id);
        assert_eq!(rename.kind, current.kind);

        // complete new owner rebuilds the bucket
        let new_owner = ObjectId::new().to_hex();
        let mut rehome = File {
            owner_id: new_owner.clone(),
            owner_kind: Some(OwnerKind::Account),
            ..File::default()
        };
        rehome.merge_existing(&current);
        assert_eq!(rehome.bucket, format!("account_{}_bucket", new_owner));
    }

    #[test]
    fn post_validate_requires_blob() {
        let record = FileRecord {
            name: Some("report.pdf".into()),
            ..FileRecord::default()
        };
        assert!(record.post_validate().is_err());
    }

    #[test]
    fn match_priority_owner_before_blob() {
        let stored = FileRecord {
            id: Some(ObjectId::new()),
            owner_id: Some(ObjectId::new()),
            blob_id: Some(ObjectId::new()),
            ..FileRecord::default()
        };
        let filter = doc! {
            "owner_id": stored.owner_id.unwrap(),
            "blob_id": ObjectId::new(),
        };
        assert!(stored.matches(&filter));
        assert!(stored.matches(&doc! { "blob_id": stored.blob_id.unwrap() }));
    }

    #[test]
    fn domain_round_trip() {
        let mut file = sample();
        file.id = ObjectId::new().to_hex();
        file.blob_id = ObjectId::new().to_hex();
        file.size = Some(2048);
        file.build_bucket().unwrap();
        let record = FileRecord::from_domain(&file).unwrap();
        let back = record.to_domain();
        assert_eq!(back, file);
    }
}
