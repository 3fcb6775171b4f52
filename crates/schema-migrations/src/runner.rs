//! Seam between resolved steps and the storage layer that applies them.
//!
//! The crate never touches physical storage itself. A [`StepExecutor`]
//! applies steps, a [`VersionStore`] records which version is in place, and
//! [`migrate`] glues them to a [`MigrationSpec`]. Atomicity of a run is the
//! executor's business.

use std::fmt;

use crate::resolve::steps_for_migration;
use crate::spec::MigrationSpec;
use crate::step::MigrationStep;
use crate::SchemaVersion;

/// Applies structural steps to physical storage.
pub trait StepExecutor {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Apply a single step.
    fn apply(&mut self, step: &MigrationStep) -> Result<(), Self::Error>;
}

/// Tracks the schema version currently applied to a store.
pub trait VersionStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// The version currently in place.
    fn current_version(&self) -> Result<SchemaVersion, Self::Error>;

    /// Record a newly reached version.
    fn set_version(&mut self, version: SchemaVersion) -> Result<(), Self::Error>;
}

/// What a successful [`migrate`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The store was already at the target version.
    UpToDate { version: SchemaVersion },
    /// Steps were applied and the new version recorded.
    Migrated {
        from: SchemaVersion,
        to: SchemaVersion,
        steps_applied: usize,
    },
}

/// Failure of a [`migrate`] call.
#[derive(Debug)]
pub enum RunError<S, E> {
    /// The spec has no path between the two versions.
    Unsupported {
        from: SchemaVersion,
        to: SchemaVersion,
    },
    /// The store is newer than the target. Nothing was applied or recorded.
    Downgrade {
        from: SchemaVersion,
        to: SchemaVersion,
    },
    /// The version store failed.
    Store(S),
    /// Step `index` of the resolved plan failed. The version was not updated.
    Executor { index: usize, source: E },
}

impl<S: fmt::Display, E: fmt::Display> fmt::Display for RunError<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { from, to } => {
                write!(f, "no migration path from v{from} to v{to}")
            }
            Self::Downgrade { from, to } => {
                write!(f, "cannot downgrade from v{from} to v{to}")
            }
            Self::Store(e) => write!(f, "version store error: {e}"),
            Self::Executor { index, source } => {
                write!(f, "migration step {index} failed: {source}")
            }
        }
    }
}

impl<S, E> std::error::Error for RunError<S, E>
where
    S: fmt::Debug + fmt::Display,
    E: fmt::Debug + fmt::Display,
{
}

/// Bring `store` up to `target` by applying the resolved steps through `executor`.
///
/// The version is written only after every step succeeded. A store already
/// newer than `target` is rejected with [`RunError::Downgrade`].
pub fn migrate<VS, EX>(
    spec: &MigrationSpec,
    store: &mut VS,
    executor: &mut EX,
    target: SchemaVersion,
) -> Result<MigrationOutcome, RunError<VS::Error, EX::Error>>
where
    VS: VersionStore,
    EX: StepExecutor,
{
    let from = store.current_version().map_err(RunError::Store)?;
    if from == target {
        return Ok(MigrationOutcome::UpToDate { version: from });
    }
    if from > target {
        return Err(RunError::Downgrade { from, to: target });
    }

    let steps = steps_for_migration(spec, from, target)
        .ok_or(RunError::Unsupported { from, to: target })?;

    for (index, step) in steps.iter().enumerate() {
        executor
            .apply(step)
            .map_err(|source| RunError::Executor { index, source })?;
    }
    store.set_version(target).map_err(RunError::Store)?;

    log::info!(
        "migrated v{from} -> v{target} ({} steps)",
        steps.len()
    );
    Ok(MigrationOutcome::Migrated {
        from,
        to: target,
        steps_applied: steps.len(),
    })
}
