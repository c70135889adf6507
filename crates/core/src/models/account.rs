//! Account entity: the people (or machines) that own tasks and files.
//!
//! Credential strings pass through this layer opaquely; hashing and
//! verification live outside the access layer.

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

/// Domain account: hex-string references, JSON-friendly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Identity as 24-char hex; empty or all-zero means unset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Login name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Opaque credential string.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Given name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub firstname: String,
    /// Family name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lastname: String,
    /// Address used for uniqueness checks.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// `admin` or `member`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// True only for the bootstrap-seeded root account.
    #[serde(default, skip_serializing_if = "is_false")]
    pub root_admin: bool,
    /// Group membership reference, hex.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_id: String,
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

impl Account {
    /// True when `id` parses to a set identity.
    pub fn has_id(&self) -> bool {
        id::is_valid_ref(&self.id)
    }

    /// True when `group_id` parses to a set identity.
    pub fn has_group_id(&self) -> bool {
        id::is_valid_ref(&self.group_id)
    }

    /// Checks the fields required for a validation scenario, reporting
    /// every missing field in one error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing the missing fields, or for an
    /// unsupported scenario.
    pub fn validate(&self, case: ValidationCase) -> Result<()> {
        let mut missing = Vec::new();
        match case {
            ValidationCase::Auth => {
                if !self.has_id() {
                    missing.push("id");
                }
                if !self.has_group_id() {
                    missing.push("group_id");
                }
                if self.role.is_empty() {
                    missing.push("role");
                }
            }
            ValidationCase::Create => {
                if self.username.is_empty() {
                    missing.push("username");
                }
                if self.email.is_empty() {
                    missing.push("email");
                }
                if self.password.is_empty() {
                    missing.push("password");
                }
                if !self.has_group_id() {
                    missing.push("group_id");
                }
            }
            ValidationCase::Update => {
                if !self.has_id() && self.email.is_empty() {
                    missing.push("id");
                }
            }
            ValidationCase::Retrieve => {
                return Err(Error::validation("unrecognized validation case"))
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing_fields("account", &missing))
        }
    }

    /// Minimal lookup filter for modification requests: identity if set,
    /// else email.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSelector`] when neither is usable.
    pub fn build_filter(&self) -> Result<Account> {
        let mut filter = Account::default();
        if self.has_id() {
            filter.id = self.id.clone();
        } else if !self.email.is_empty() {
            filter.email = self.email.clone();
        } else {
            return Err(Error::malformed_selector(
                "account is missing a valid query filter",
            ));
        }
        Ok(filter)
    }

    /// Fills each unset field from the currently stored account before an
    /// update is applied.
    pub fn merge_existing(&mut self, current: &Account) {
        if self.username.is_empty() {
            self.username = current.username.clone();
        }
        if self.firstname.is_empty() {
            self.firstname = current.firstname.clone();
        }
        if self.lastname.is_empty() {
            self.lastname = current.lastname.clone();
        }
        if self.email.is_empty() {
            self.email = current.email.clone();
        }
        if self.group_id.is_empty() {
            self.group_id = current.group_id.clone();
        }
        if self.role.is_empty() {
            self.role = current.role.clone();
        }
    }
}

/// Storage-side account document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Identity; unset ids are omitted from the transport form.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Opaque credential string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    /// Address used for uniqueness checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `admin` or `member`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// True only for the bootstrap-seeded root account.
    #[serde(default, skip_serializing_if = "is_false")]
    pub root_admin: bool,
    /// Group membership reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ObjectId>,
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

impl AccountRecord {
    /// Builds a storage record from a domain account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSelector`] when a reference string is not
    /// valid hex.
    pub fn from_domain(account: &Account) -> Result<Self> {
        Ok(AccountRecord {
            id: id::parse(&account.id)?,
            username: opt_string(&account.username),
            password: opt_string(&account.password),
            firstname: opt_string(&account.firstname),
            lastname: opt_string(&account.lastname),
            email: opt_string(&account.email),
            role: opt_string(&account.role),
            root_admin: account.root_admin,
            group_id: id::parse(&account.group_id)?,
            last_modified: to_bson_time(account.last_modified),
            created_at: to_bson_time(account.created_at),
            deleted_at: to_bson_time(account.deleted_at),
        })
    }

    /// Renders the record back into a domain account.
    pub fn to_domain(&self) -> Account {
        Account {
            id: id::hex(self.id),
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            firstname: self.firstname.clone().unwrap_or_default(),
            lastname: self.lastname.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            role: self.role.clone().unwrap_or_default(),
            root_admin: self.root_admin,
            group_id: id::hex(self.group_id),
            last_modified: to_chrono_time(self.last_modified),
            created_at: to_chrono_time(self.created_at),
            deleted_at: to_chrono_time(self.deleted_at),
        }
    }
}

impl StoreRecord for AccountRecord {
    const COLLECTION: &'static str = "accounts";

    fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    fn to_filter(&self) -> Result<Document> {
        if let Some(v) = id::set(self.id) {
            Ok(doc! { "_id": v })
        } else if let Some(v) = id::set(self.group_id) {
            Ok(doc! { "group_id": v })
        } else if let Some(v) = nonempty(&self.email) {
            Ok(doc! { "email": v })
        } else {
            Ok(Document::new())
        }
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(bson::from_document(doc.clone())?)
    }

    fn apply_partial(&mut self, doc: &Document) -> Result<()> {
        let incoming = Self::from_document(doc)?;
        if nonempty(&incoming.username).is_some() {
            self.username = incoming.username;
        }
        if nonempty(&incoming.firstname).is_some() {
            self.firstname = incoming.firstname;
        }
        if nonempty(&incoming.lastname).is_some() {
            self.lastname = incoming.lastname;
        }
        if nonempty(&incoming.email).is_some() {
            self.email = incoming.email;
        }
        if nonempty(&incoming.password).is_some() {
            self.password = incoming.password;
        }
        if let Some(v) = id::set(incoming.group_id) {
            self.group_id = Some(v);
        }
        if nonempty(&incoming.role).is_some() {
            self.role = incoming.role;
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
        if nonempty(&self.email).is_none() {
            return Err(Error::validation("account record does not have an email"));
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
        if let Some(v) = nonempty(&f.email) {
            return self.email.as_deref() == Some(v);
        }
        if let Some(v) = id::set(f.group_id) {
            return id::set(self.group_id) == Some(v);
        }
        false
    }
}
