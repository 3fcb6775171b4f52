//! # schema-migrations
//!
//! Versioned schema migration specs for structured stores.
//!
//! A store's schema evolves through numbered versions. Each [`Migration`]
//! names the version it arrives at and carries an ordered list of structural
//! [`MigrationStep`]s (create a table, add columns, rename a column, ...).
//! This crate validates those definitions up front and answers one question
//! at runtime: *which steps, in which order, move a store from version A to
//! version B?*
//!
//! ## How It Works
//!
//! 1. **Step constructors** ([`create_table`], [`add_columns`], ...) normalize
//!    loose input into canonical step records, checking every identifier with
//!    [`validate_name`].
//! 2. [`schema_migrations`] sorts the migrations, rejects duplicate or
//!    missing versions, and computes the range it covers.
//! 3. [`steps_for_migration`] resolves a version range to the concatenated
//!    steps, or `None` when the spec cannot cover it.
//! 4. A storage layer applies the steps through [`StepExecutor`] and records
//!    the new version in a [`VersionStore`] (see [`migrate`]).
//!
//! ## Quick Start
//!
//! ```
//! use schema_migrations::*;
//!
//! let spec = schema_migrations(vec![
//!     Migration::new(3, vec![
//!         rename_column(RenameColumnArgs::new("comments", "text", "body")).unwrap(),
//!     ]),
//!     Migration::new(2, vec![
//!         add_columns(AddColumnsArgs::new(
//!             "comments",
//!             vec![ColumnArgs::new("text", "string").optional()],
//!         ))
//!         .unwrap(),
//!     ]),
//! ])
//! .unwrap();
//!
//! assert_eq!(spec.min_version(), 1);
//! assert_eq!(spec.max_version(), 3);
//!
//! let steps = steps_for_migration(&spec, 1, 3).unwrap();
//! assert_eq!(steps.len(), 2);
//! assert_eq!(steps[0].kind(), StepKind::AddColumns);
//!
//! assert!(steps_for_migration(&spec, 1, 4).is_none());
//! ```
//!
//! ## Key Concepts
//!
//! - **Fail fast**: every validation error is raised while building steps
//!   or the spec, never while resolving.
//! - **Immutable**: a [`MigrationSpec`] is never modified after it is built.
//! - **Contiguous**: once sorted, target versions must be consecutive.

mod column;
mod definition;
mod error;
mod memory;
mod name;
mod resolve;
mod runner;
mod spec;
mod step;

pub use column::{ColumnSchema, ColumnType, ColumnValue, TableSchema};
pub use definition::{
    load, migration_from_value, migrations_from_json, migrations_from_toml,
    migrations_from_value, step_from_value, DefinitionError,
};
pub use error::{MigrationError, Result};
pub use memory::{MemorySchema, MemorySchemaError};
pub use name::{validate_name, UnsafeNameReason, HOST_INTRINSIC_NAMES, RESERVED_NAMES};
pub use resolve::steps_for_migration;
pub use runner::{migrate, MigrationOutcome, RunError, StepExecutor, VersionStore};
pub use spec::{check_version_sequence, schema_migrations, Migration, MigrationSpec};
pub use step::{
    add_columns, create_table, destroy_column, destroy_table, make_column_optional,
    make_column_required, rename_column, AddColumnsArgs, ColumnArgs, CreateTableArgs,
    DestroyColumnArgs, DestroyTableArgs, MakeColumnOptionalArgs, MakeColumnRequiredArgs,
    MigrationStep, RenameColumnArgs, StepKind,
};

/// A schema version number.
pub type SchemaVersion = u32;

/// The version of a freshly created store, before any migration.
pub const INITIAL_SCHEMA_VERSION: SchemaVersion = 1;

/// The lowest version a migration may target.
pub const MIN_MIGRATION_VERSION: SchemaVersion = 2;
