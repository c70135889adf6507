//! ObjectId helpers.
//!
//! Records are identified by 12-byte ObjectIds, rendered as 24-character hex
//! strings in domain models. The all-zero id is reserved as the explicit
//! unset sentinel and is treated identically to an absent id everywhere:
//! selector derivation, match tests, merge, and identity assignment.

use crate::error::{Error, Result};
use bson::oid::ObjectId;

/// Hex rendering of the unset sentinel.
pub const UNSET_HEX: &str = "000000000000000000000000";

/// Byte-level check for the all-zero sentinel.
pub fn is_zero(id: &ObjectId) -> bool {
    id.bytes() == [0u8; 12]
}

/// Collapses `Some(zero)` to `None`, leaving set ids untouched.
pub fn set(id: Option<ObjectId>) -> Option<ObjectId> {
    id.filter(|v| !is_zero(v))
}

/// Parses a domain-model id string.
///
/// Empty and all-zero strings are the unset sentinel and parse to `None`.
///
/// # Errors
///
/// Returns [`Error::MalformedSelector`] for any other non-hex input.
pub fn parse(s: &str) -> Result<Option<ObjectId>> {
    if s.is_empty() || s == UNSET_HEX {
        return Ok(None);
    }
    let oid: ObjectId = s
        .parse()
        .map_err(|e: bson::oid::Error| Error::malformed_selector(e.to_string()))?;
    Ok(set(Some(oid)))
}

/// Renders an optional id for domain models; `None` becomes the empty string.
pub fn hex(id: Option<ObjectId>) -> String {
    match set(id) {
        Some(v) => v.to_hex(),
        None => String::new(),
    }
}

/// True when `s` parses to a set (non-zero) id.
pub fn is_valid_ref(s: &str) -> bool {
    matches!(parse(s), Ok(Some(_)))
}
