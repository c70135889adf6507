//! Entity shapes.
//!
//! Each entity comes in two forms:
//! - a **domain model** (`Account`, `Group`, ...): hex-string ids, UTC
//!   timestamps as `chrono` values, JSON-friendly, with the pre-write
//!   validation and merge builders the services use;
//! - a **storage record** (`AccountRecord`, ...): ObjectId references and
//!   store-native timestamps, implementing the
//!   [`StoreRecord`](crate::StoreRecord) capability set.
//!
//! Unset fields are omitted in both serialized forms, which is what makes
//! filter documents partial and update documents non-destructive.

pub mod account;
pub mod blacklist;
pub mod file;
pub mod group;
pub mod task;

use crate::error::Error;

/// Validation scenario for a domain model write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCase {
    /// Identity data loaded from a session token.
    Auth,
    /// A new record about to be inserted.
    Create,
    /// A partial record about to be merged into a stored one.
    Update,
    /// A partial record used to look something up.
    Retrieve,
}

/// One validation error naming every missing field at once.
pub(crate) fn missing_fields(entity: &str, fields: &[&str]) -> Error {
    Error::validation(format!(
        "missing the following {} fields: {}",
        entity,
        fields.join(", ")
    ))
}

/// `omitempty` check for strings: absent and empty are both unset.
pub(crate) fn nonempty(value: &Option<String>) -> Option<&str> {
    match value.as_deref() {
        Some("") | None => None,
        Some(v) => Some(v),
    }
}

/// Maps empty domain strings to `None` for storage records.
pub(crate) fn opt_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Serde skip helper for `omitempty` booleans.
pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

/// Domain timestamp to storage timestamp.
pub(crate) fn to_bson_time(
    value: Option<chrono::DateTime<chrono::Utc>>,
) -> Option<bson::DateTime> {
    value.map(bson::DateTime::from_chrono)
}

/// Storage timestamp to domain timestamp.
pub(crate) fn to_chrono_time(
    value: Option<bson::DateTime>,
) -> Option<chrono::DateTime<chrono::Utc>> {
    value.map(bson::DateTime::to_chrono)
}
