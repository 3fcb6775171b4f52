use std::fmt;

use crate::name::UnsafeNameReason;
use crate::step::StepKind;
use crate::SchemaVersion;

/// Error raised while constructing steps or building a migration spec.
///
/// Every variant is a deterministic input-validation failure. They surface
/// at definition time and are never raised by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// A migration entry is missing `toVersion` / `steps`, or they have the wrong shape.
    MalformedMigration { index: usize, reason: String },
    /// A step carries no recognized `type` tag.
    MalformedStep {
        to_version: SchemaVersion,
        index: usize,
        tag: Option<String>,
    },
    /// A standalone step record carries no recognized `type` tag.
    UnknownStepType { tag: Option<String> },
    /// A step constructor is missing a required field.
    MalformedField { step: StepKind, field: &'static str },
    /// A column declares a type outside the supported set.
    InvalidColumnType { column: String, column_type: String },
    /// A table or column identifier was rejected by the name validator.
    UnsafeName {
        name: String,
        reason: UnsafeNameReason,
    },
    /// Two columns of the same table share a name.
    DuplicateColumn { table: String, column: String },
    /// A migration targets a version below the minimum (2).
    VersionRange { to_version: i64 },
    /// Two migrations target the same version.
    DuplicateVersion { version: SchemaVersion },
    /// Consecutive migrations skip one or more versions.
    VersionGap {
        after: SchemaVersion,
        next: SchemaVersion,
    },
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedMigration { index, reason } => {
                write!(f, "Invalid migration at index {index}: {reason}")
            }
            Self::MalformedStep {
                to_version,
                index,
                tag,
            } => match tag {
                Some(tag) => write!(
                    f,
                    "Invalid migration steps for v{to_version}: step {index} has unknown type `{tag}`"
                ),
                None => write!(
                    f,
                    "Invalid migration steps for v{to_version}: step {index} has no type"
                ),
            },
            Self::UnknownStepType { tag: Some(tag) } => {
                write!(f, "Invalid migration step: unknown type `{tag}`")
            }
            Self::UnknownStepType { tag: None } => write!(f, "Invalid migration step: no type"),
            Self::MalformedField { step, field } => {
                write!(f, "Missing or invalid `{field}` in {step}()")
            }
            Self::InvalidColumnType {
                column,
                column_type,
            } => write!(
                f,
                "Invalid type `{column_type}` for column `{column}` (expected string, number or boolean)"
            ),
            Self::UnsafeName { name, reason } => {
                write!(f, "Unsafe name `{name}` not allowed ({reason})")
            }
            Self::DuplicateColumn { table, column } => {
                write!(f, "table `{table}` declares column `{column}` more than once")
            }
            Self::VersionRange { to_version } => write!(
                f,
                "Invalid migration to version {to_version}. Minimum possible migration version is 2"
            ),
            Self::DuplicateVersion { version } => write!(
                f,
                "Invalid migrations: found duplicates of migration to version {version}"
            ),
            Self::VersionGap { after, next } => write!(
                f,
                "Invalid migrations: migrations must be listed without gaps (v{after} is followed by v{next})"
            ),
        }
    }
}

impl std::error::Error for MigrationError {}

/// Convenience alias used throughout the crate.
pub type Result<T, E = MigrationError> = std::result::Result<T, E>;
