//! Task entity: work items owned by an account inside a group.

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

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but untouched.
    #[default]
    NotStarted,
    /// Someone is working on it.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// The wire encoding of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

/// Domain task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identity as 24-char hex; empty or all-zero means unset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Short title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Lifecycle state; unset means not started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Deadline, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    /// Free-form details.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Owning account reference, hex.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    /// Group the task belongs to, hex.
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

impl Task {
    /// True when `id` parses to a set identity.
    pub fn has_id(&self) -> bool {
        id::is_valid_ref(&self.id)
    }

    /// True when `account_id` parses to a set identity.
    pub fn has_account_id(&self) -> bool {
        id::is_valid_ref(&self.account_id)
    }

    /// True when `group_id` parses to a set identity.
    pub fn has_group_id(&self) -> bool {
        id::is_valid_ref(&self.group_id)
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
                if !self.has_account_id() {
                    missing.push("account_id");
                }
                if !self.has_group_id() {
                    missing.push("group_id");
                }
                if self.due.is_none() {
                    missing.push("due");
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
            Err(missing_fields("task", &missing))
        }
    }

    /// Fills each unset field from the currently stored task before an
    /// update is applied.
    pub fn merge_existing(&mut self, current: &Task) {
        if self.name.is_empty() {
            self.name = current.name.clone();
        }
        if self.status.is_none() {
            self.status = current.status;
        }
        if self.due.is_none() {
            self.due = current.due;
        }
        if self.description.is_empty() {
            self.description = current.description.clone();
        }
        if self.account_id.is_empty() {
            self.account_id = current.account_id.clone();
        }
        if self.group_id.is_empty() {
            self.group_id = current.group_id.clone();
        }
    }
}

/// Storage-side task document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Identity; unset ids are omitted from the transport form.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lifecycle state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<bson::DateTime>,
    /// Free-form details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning account reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<ObjectId>,
    /// Group the task belongs to.
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

impl TaskRecord {
    /// Builds a storage record from a domain task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSelector`] when a reference string is not
    /// valid hex.
    pub fn from_domain(task: &Task) -> Result<Self> {
        Ok(TaskRecord {
            id: id::parse(&task.id)?,
            name: opt_string(&task.name),
            status: task.status,
            due: to_bson_time(task.due),
            description: opt_string(&task.description),
            account_id: id::parse(&task.account_id)?,
            group_id: id::parse(&task.group_id)?,
            last_modified: to_bson_time(task.last_modified),
            created_at: to_bson_time(task.created_at),
            deleted_at: to_bson_time(task.deleted_at),
        })
    }

    /// Renders the record back into a domain task.
    pub fn to_domain(&self) -> Task {
        Task {
            id: id::hex(self.id),
            name: self.name.clone().unwrap_or_default(),
            status: self.status,
            due: to_chrono_time(self.due),
            description: self.description.clone().unwrap_or_default(),
            account_id: id::hex(self.account_id),
            group_id: id::hex(self.group_id),
            last_modified: to_chrono_time(self.last_modified),
            created_at: to_chrono_time(self.created_at),
            deleted_at: to_chrono_time(self.deleted_at),
        }
    }
}

impl StoreRecord for TaskRecord {
    const COLLECTION: &'static str = "tasks";

    fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    fn to_filter(&self) -> Result<Document> {
        if let Some(v) = id::set(self.id) {
            Ok(doc! { "_id": v })
        } else if let Some(v) = id::set(self.group_id) {
            Ok(doc! { "group_id": v })
        } else if let Some(v) = id::set(self.account_id) {
            Ok(doc! { "account_id": v })
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
        if incoming.status.is_some() {
            self.status = incoming.status;
        }
        if incoming.due.is_some() {
            self.due = incoming.due;
        }
        if nonempty(&incoming.description).is_some() {
            self.description = incoming.description;
        }
        if let Some(v) = id::set(incoming.account_id) {
            self.account_id = Some(v);
        }
        if let Some(v) = id::set(incoming.group_id) {
            self.group_id = Some(v);
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
        if id::set(self.account_id).is_none() {
            return Err(Error::validation(
                "task record does not have an owning account",
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
        if let Some(v) = id::set(f.account_id) {
            return id::set(self.account_id) == Some(v);
        }
        if let Some(v) = id::set(f.group_id) {
            return id::set(self.group_id) == Some(v);
        }
        false
    }
}
