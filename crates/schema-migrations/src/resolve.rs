use crate::spec::MigrationSpec;
use crate::step::MigrationStep;
use crate::SchemaVersion;

/// Steps that move a store from `from_version` to `to_version`.
///
/// Returns `None` when the spec cannot cover the range (`from_version` is
/// older than [`MigrationSpec::min_version`] or `to_version` is newer than
/// [`MigrationSpec::max_version`]). An empty vector means there is nothing
/// to do.
///
/// Selected migrations satisfy `from_version < to_version_of_migration <= to_version`;
/// their steps are concatenated in ascending version order.
///
/// # Example
///
/// ```
/// use schema_migrations::{
///     destroy_table, schema_migrations, steps_for_migration, DestroyTableArgs, Migration,
/// };
///
/// let drop = destroy_table(DestroyTableArgs::new("comments")).unwrap();
/// let spec = schema_migrations(vec![
///     Migration::new(3, vec![drop.clone()]),
///     Migration::new(4, vec![]),
/// ])
/// .unwrap();
///
/// assert_eq!(steps_for_migration(&spec, 2, 4), Some(vec![&drop]));
/// assert_eq!(steps_for_migration(&spec, 3, 4), Some(vec![]));
/// assert_eq!(steps_for_migration(&spec, 1, 4), None);
/// ```
pub fn steps_for_migration(
    spec: &MigrationSpec,
    from_version: SchemaVersion,
    to_version: SchemaVersion,
) -> Option<Vec<&MigrationStep>> {
    if from_version < spec.min_version() || to_version > spec.max_version() {
        log::debug!(
            "no migration path v{from_version} -> v{to_version} (spec covers v{}..=v{})",
            spec.min_version(),
            spec.max_version()
        );
        return None;
    }

    let steps: Vec<&MigrationStep> = spec
        .sorted_migrations()
        .iter()
        .filter(|m| from_version < m.to_version && m.to_version <= to_version)
        .flat_map(|m| m.steps.iter())
        .collect();

    log::debug!(
        "resolved {} steps for v{from_version} -> v{to_version}",
        steps.len()
    );
    Some(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{schema_migrations, Migration};
    use crate::step::{destroy_column, DestroyColumnArgs};

    fn step(column: &str) -> MigrationStep {
        destroy_column(DestroyColumnArgs::new("posts", column)).unwrap()
    }

    fn scenario() -> (MigrationSpec, [MigrationStep; 3]) {
        let steps = [step("s1"), step("s2"), step("s3")];
        let spec = schema_migrations(vec![
            Migration::new(5, vec![steps[1].clone(), steps[2].clone()]),
            Migration::new(4, vec![]),
            Migration::new(3, vec![steps[0].clone()]),
        ])
        .unwrap();
        (spec, steps)
    }

    #[test]
    fn resolves_ranges() {
        let (spec, [s1, s2, s3]) = scenario();
        assert_eq!(steps_for_migration(&spec, 2, 3), Some(vec![&s1]));
        assert_eq!(steps_for_migration(&spec, 2, 4), Some(vec![&s1]));
        assert_eq!(steps_for_migration(&spec, 2, 5), Some(vec![&s1, &s2, &s3]));
        assert_eq!(steps_for_migration(&spec, 3, 5), Some(vec![&s2, &s3]));
        assert_eq!(steps_for_migration(&spec, 4, 5), Some(vec![&s2, &s3]));
        assert_eq!(steps_for_migration(&spec, 3, 4), Some(vec![]));
    }

    #[test]
    fn unsupported_ranges() {
        let (spec, _) = scenario();
        assert_eq!(steps_for_migration(&spec, 1, 2), None);
        assert_eq!(steps_for_migration(&spec, 1, 3), None);
        assert_eq!(steps_for_migration(&spec, 1, 5), None);
        assert_eq!(steps_for_migration(&spec, 3, 6), None);
        assert_eq!(steps_for_migration(&spec, 5, 6), None);

        let empty = schema_migrations(vec![]).unwrap();
        assert_eq!(steps_for_migration(&empty, 1, 2), None);
    }

    #[test]
    fn same_version_is_empty() {
        let (spec, _) = scenario();
        assert_eq!(steps_for_migration(&spec, 5, 5), Some(vec![]));

        let empty = schema_migrations(vec![]).unwrap();
        assert_eq!(steps_for_migration(&empty, 1, 1), Some(vec![]));
    }

    #[test]
    fn downgrade_request_is_not_reversed() {
        let (spec, _) = scenario();
        assert_eq!(steps_for_migration(&spec, 5, 3), Some(vec![]));
    }
}
