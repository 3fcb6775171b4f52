//! Identifier safety checks shared by every step constructor.

use std::fmt;

use crate::error::{MigrationError, Result};

/// Property names intrinsic to the host object model. Using one as a dynamic
/// key would shadow it.
pub const HOST_INTRINSIC_NAMES: &[&str] = &[
    "__proto__",
    "constructor",
    "prototype",
    "hasOwnProperty",
    "isPrototypeOf",
    "toString",
    "toLocaleString",
    "valueOf",
];

/// Names used internally by storage engines and the record layer.
/// Compared case-insensitively.
pub const RESERVED_NAMES: &[&str] = &[
    "id",
    "_changed",
    "_status",
    "local_storage",
    "$loki",
    "oid",
    "_rowid_",
    "rowid",
];

/// Why [`validate_name`] rejected an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsafeNameReason {
    /// Collides with an intrinsic property of the host object model.
    HostIntrinsic,
    /// Reserved by a storage engine or the record layer.
    Reserved,
    /// Starts with `__`, which is reserved for internal use.
    DoubleUnderscore,
    /// Contains characters outside `[A-Za-z0-9_]` or starts with a digit.
    UnsafeCharacters,
}

impl fmt::Display for UnsafeNameReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostIntrinsic => write!(f, "host object property"),
            Self::Reserved => write!(f, "reserved name"),
            Self::DoubleUnderscore => write!(f, "names starting with __ are reserved"),
            Self::UnsafeCharacters => {
                write!(f, "names must match [A-Za-z_][A-Za-z0-9_]*")
            }
        }
    }
}

/// Check that `candidate` is safe to use as a table or column name.
///
/// Returns the candidate unchanged on success.
///
/// # Example
///
/// ```
/// use schema_migrations::validate_name;
///
/// assert_eq!(validate_name("post_id").unwrap(), "post_id");
/// assert!(validate_name("ROWID").is_err());
/// assert!(validate_name("foo' and delete * from users --").is_err());
/// ```
pub fn validate_name(candidate: &str) -> Result<&str> {
    match unsafe_reason(candidate) {
        None => Ok(candidate),
        Some(reason) => Err(MigrationError::UnsafeName {
            name: candidate.to_string(),
            reason,
        }),
    }
}

fn unsafe_reason(candidate: &str) -> Option<UnsafeNameReason> {
    if HOST_INTRINSIC_NAMES.contains(&candidate) {
        return Some(UnsafeNameReason::HostIntrinsic);
    }
    if RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(candidate))
    {
        return Some(UnsafeNameReason::Reserved);
    }
    if candidate.starts_with("__") {
        return Some(UnsafeNameReason::DoubleUnderscore);
    }
    if !has_safe_characters(candidate) {
        return Some(UnsafeNameReason::UnsafeCharacters);
    }
    None
}

fn has_safe_characters(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
