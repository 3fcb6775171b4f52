use serde::Serialize;

use crate::error::{MigrationError, Result};
use crate::step::MigrationStep;
use crate::{SchemaVersion, INITIAL_SCHEMA_VERSION, MIN_MIGRATION_VERSION};

/// A transition that arrives at `to_version` by applying `steps` in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Migration {
    /// The schema version this migration produces.
    pub to_version: SchemaVersion,
    /// Steps, applied in declaration order.
    pub steps: Vec<MigrationStep>,
}

impl Migration {
    /// Create a migration arriving at `to_version`.
    pub fn new(to_version: SchemaVersion, steps: Vec<MigrationStep>) -> Self {
        Self { to_version, steps }
    }
}

/// A validated, version-sorted set of migrations.
///
/// Built once by [`schema_migrations`] and never mutated afterwards, so it
/// can be shared freely between threads.
///
/// Serializes as `{ sortedMigrations, minVersion, maxVersion, validated }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSpec {
    sorted_migrations: Vec<Migration>,
    min_version: SchemaVersion,
    max_version: SchemaVersion,
    validated: bool,
}

impl MigrationSpec {
    /// Migrations, ascending by target version.
    pub fn sorted_migrations(&self) -> &[Migration] {
        &self.sorted_migrations
    }

    /// Oldest version a store can be migrated from.
    pub fn min_version(&self) -> SchemaVersion {
        self.min_version
    }

    /// Newest version a store can be migrated to.
    pub fn max_version(&self) -> SchemaVersion {
        self.max_version
    }

    /// Always `true`: a spec only exists once its input passed validation.
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Total number of steps across all migrations.
    pub fn step_count(&self) -> usize {
        self.sorted_migrations.iter().map(|m| m.steps.len()).sum()
    }
}

/// Validate and assemble a set of migrations.
///
/// Input order does not matter; the result is sorted by target version.
/// Every target must be at least 2, and once sorted the targets must be
/// distinct and consecutive. The first migration may start above version 2.
///
/// # Example
///
/// ```
/// use schema_migrations::{destroy_table, schema_migrations, DestroyTableArgs, Migration};
///
/// let spec = schema_migrations(vec![
///     Migration::new(5, vec![destroy_table(DestroyTableArgs::new("comments")).unwrap()]),
///     Migration::new(4, vec![]),
/// ])
/// .unwrap();
///
/// assert_eq!(spec.min_version(), 3);
/// assert_eq!(spec.max_version(), 5);
/// assert_eq!(spec.sorted_migrations()[0].to_version, 4);
///
/// let err = schema_migrations(vec![Migration::new(2, vec![]), Migration::new(2, vec![])]);
/// assert!(err.unwrap_err().to_string().contains("duplicates"));
/// ```
pub fn schema_migrations(migrations: Vec<Migration>) -> Result<MigrationSpec> {
    for migration in &migrations {
        for step in &migration.steps {
            step.validate()?;
        }
        if migration.to_version < MIN_MIGRATION_VERSION {
            return Err(MigrationError::VersionRange {
                to_version: i64::from(migration.to_version),
            });
        }
    }

    let mut sorted_migrations = migrations;
    sorted_migrations.sort_by_key(|m| m.to_version);

    let versions: Vec<SchemaVersion> = sorted_migrations.iter().map(|m| m.to_version).collect();
    check_version_sequence(&versions)?;

    let (min_version, max_version) = match (versions.first(), versions.last()) {
        (Some(&first), Some(&last)) => (first - 1, last),
        _ => (INITIAL_SCHEMA_VERSION, INITIAL_SCHEMA_VERSION),
    };

    log::debug!(
        "built migration spec: {} migrations, v{min_version}..=v{max_version}",
        sorted_migrations.len()
    );

    Ok(MigrationSpec {
        sorted_migrations,
        min_version,
        max_version,
        validated: true,
    })
}

/// Check an ascending sequence of target versions for duplicates and gaps.
///
/// Only neighbouring entries are compared; there is no implicit floor.
pub fn check_version_sequence(sorted_versions: &[SchemaVersion]) -> Result<()> {
    for pair in sorted_versions.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if prev == next {
            return Err(MigrationError::DuplicateVersion { version: next });
        }
        if next - prev > 1 {
            return Err(MigrationError::VersionGap { after: prev, next });
        }
    }
    Ok(())
}
