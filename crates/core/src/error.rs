//! Error types for the access layer.
//!
//! Every fallible operation in the workspace returns [`Error`]. Errors are:
//! - **Structured**: each variant carries typed fields for the failure
//! - **Serializable**: outcomes can be stored and compared by callers
//! - **Stable**: handlers and services propagate them unchanged, no wrapping
//!
//! There is no retry layer; a failed call surfaces its error to the caller
//! on the first attempt.

use serde::{Deserialize, Serialize};

/// Result type alias for access-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Access-layer errors.
///
/// # Categories
///
/// | Category    | Variants                                   |
/// |-------------|--------------------------------------------|
/// | Lookup      | `NotFound`                                 |
/// | Validation  | `Validation`, `MalformedSelector`          |
/// | Uniqueness  | `DuplicateKey`                             |
/// | References  | `InvalidReference`, `ScopeMismatch`        |
/// | Data        | `Decode`                                   |
/// | Deadlines   | `Timeout`                                  |
/// | System      | `Backend`, `InvalidOperation`              |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Lookup ====================
    /// No document in the collection matched the selector.
    #[error("document not found in {collection}")]
    NotFound {
        /// Collection that was queried.
        collection: String,
    },

    // ==================== Validation ====================
    /// A record failed pre-write or post-load validation.
    #[error("validation failed: {reason}")]
    Validation {
        /// What was missing or malformed.
        reason: String,
    },

    /// No usable selector field was populated, or an identifier string was
    /// malformed. Raised before any store I/O.
    #[error("malformed selector: {reason}")]
    MalformedSelector {
        /// Why the selector could not be derived.
        reason: String,
    },

    // ==================== Uniqueness ====================
    /// A uniqueness pre-check found the value already in use.
    #[error("duplicate key: {field} already in use")]
    DuplicateKey {
        /// The field whose value collided.
        field: String,
    },

    // ==================== References ====================
    /// A linked-record lookup failed during referential validation.
    #[error("invalid reference: {reason}")]
    InvalidReference {
        /// Which reference could not be resolved.
        reason: String,
    },

    /// Linked records exist but their cross-field consistency check failed.
    #[error("record out of scope: {reason}")]
    ScopeMismatch {
        /// Which relationship was inconsistent.
        reason: String,
    },

    // ==================== Data ====================
    /// Document-to-record decode (or record-to-document encode) failure,
    /// including cursor reads past the end.
    #[error("decode error: {reason}")]
    Decode {
        /// Underlying codec failure.
        reason: String,
    },

    // ==================== Deadlines ====================
    /// A store call exceeded its per-operation deadline.
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// The operation that was cancelled.
        operation: String,
        /// The deadline that elapsed, in seconds.
        secs: u64,
    },

    // ==================== System ====================
    /// Driver or system I/O failure, carried as text.
    #[error("backend error: {reason}")]
    Backend {
        /// Underlying failure.
        reason: String,
    },

    /// Store misuse: double connect, unregistered collection, insert
    /// without identity, routine resolved before dispatch.
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// What was misused.
        reason: String,
    },
}

impl Error {
    /// Lookup miss in `collection`.
    pub fn not_found(collection: impl Into<String>) -> Self {
        Error::NotFound {
            collection: collection.into(),
        }
    }

    /// Pre-write or post-load validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation {
            reason: reason.into(),
        }
    }

    /// Selector could not be derived from the given filter record.
    pub fn malformed_selector(reason: impl Into<String>) -> Self {
        Error::MalformedSelector {
            reason: reason.into(),
        }
    }

    /// Uniqueness collision on `field`.
    pub fn duplicate_key(field: impl Into<String>) -> Self {
        Error::DuplicateKey {
            field: field.into(),
        }
    }

    /// Referential-validation lookup failure.
    pub fn invalid_reference(reason: impl Into<String>) -> Self {
        Error::InvalidReference {
            reason: reason.into(),
        }
    }

    /// Cross-field consistency failure between linked records.
    pub fn scope_mismatch(reason: impl Into<String>) -> Self {
        Error::ScopeMismatch {
            reason: reason.into(),
        }
    }

    /// Codec failure.
    pub fn decode(reason: impl Into<String>) -> Self {
        Error::Decode {
            reason: reason.into(),
        }
    }

    /// Deadline elapsed on `operation`.
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Driver-level failure, stringified at the boundary.
    pub fn backend(reason: impl Into<String>) -> Self {
        Error::Backend {
            reason: reason.into(),
        }
    }

    /// Store misuse.
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Error::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// True for the lookup-miss variant; services use this to distinguish
    /// "absent" from real failures in pre-write checks.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<bson::ser::Error> for Error {
    fn from(e: bson::ser::Error) -> Self {
        Error::decode(e.to_string())
    }
}

impl From<bson::de::Error> for Error {
    fn from(e: bson::de::Error) -> Self {
        Error::decode(e.to_string())
    }
}

impl From<bson::oid::Error> for Error {
    fn from(e: bson::oid::Error) -> Self {
        Error::malformed_selector(e.to_string())
    }
}
