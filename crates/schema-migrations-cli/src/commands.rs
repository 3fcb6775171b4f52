use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use schema_migrations::{
    load, migrate, steps_for_migration, MemorySchema, Migration, MigrationOutcome,
    MigrationSpec, MigrationStep, SchemaVersion,
};

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// The definitions cannot migrate between the requested versions.
#[derive(Debug)]
pub struct Unsupported {
    from: SchemaVersion,
    to: SchemaVersion,
    min: SchemaVersion,
    max: SchemaVersion,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported migration v{} -> v{} (definitions cover v{}..=v{})",
            self.from, self.to, self.min, self.max
        )
    }
}

impl std::error::Error for Unsupported {}

/// `schema-migrations check <file>`: validate and summarize.
pub fn check(file: &Path) -> Result {
    let spec = load(file)?;

    println!("Definitions: {}", file.display());
    println!(
        "Versions: v{} -> v{} ({} migrations, {} steps)",
        spec.min_version(),
        spec.max_version(),
        spec.sorted_migrations().len(),
        spec.step_count()
    );
    println!();

    if spec.sorted_migrations().is_empty() {
        println!("  (no migrations)");
        return Ok(());
    }

    println!("  {:>8}  {:>6}  {:<40}", "Version", "Steps", "Tables");
    println!("  {}", "-".repeat(58));
    for migration in spec.sorted_migrations() {
        let tables = touched_tables(migration);
        println!(
            "  {:>8}  {:>6}  {:<40}",
            format!("v{}", migration.to_version),
            migration.steps.len(),
            tables.join(", ")
        );
    }
    println!();

    Ok(())
}

/// `schema-migrations show <file>`: print the spec record.
pub fn show(file: &Path) -> Result {
    let spec = load(file)?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

/// `schema-migrations plan <file> --from N [--to M]`: print the resolved steps.
pub fn plan(file: &Path, from: SchemaVersion, to: Option<SchemaVersion>) -> Result {
    let spec = load(file)?;
    let to = to.unwrap_or(spec.max_version());
    let steps = resolve(&spec, from, to)?;

    log::debug!("plan v{from} -> v{to}: {} steps", steps.len());
    for (i, step) in steps.iter().enumerate() {
        eprintln!("  {:>3}. {}", i + 1, describe(step));
    }
    println!("{}", serde_json::to_string_pretty(&steps)?);
    Ok(())
}

/// `schema-migrations simulate <file> [--from N] [--to M]`: dry-run the plan
/// against an in-memory schema rebuilt up to version N.
pub fn simulate(file: &Path, from: SchemaVersion, to: Option<SchemaVersion>) -> Result {
    let spec = load(file)?;
    let to = to.unwrap_or(spec.max_version());
    let (outcome, schema) = run_simulation(&spec, from, to)?;

    match outcome {
        MigrationOutcome::UpToDate { version } => println!("Already at v{version}"),
        MigrationOutcome::Migrated {
            from,
            to,
            steps_applied,
        } => println!("Migrated v{from} -> v{to} ({steps_applied} steps)"),
    }
    println!();

    let mut empty = true;
    for table in schema.tables() {
        empty = false;
        println!("{}", table.name());
        for column in table.column_array() {
            let mut flags = Vec::new();
            if column.is_optional {
                flags.push("optional");
            }
            if column.is_indexed {
                flags.push("indexed");
            }
            println!(
                "  {:<24} {:<8} {}",
                column.name,
                column.column_type.as_str(),
                flags.join(", ")
            );
        }
    }
    if empty {
        println!("  (no tables)");
    }

    Ok(())
}

/// Replay the definitions from the oldest version up to `from`, then migrate
/// to `to`.
fn run_simulation(
    spec: &MigrationSpec,
    from: SchemaVersion,
    to: SchemaVersion,
) -> std::result::Result<(MigrationOutcome, MemorySchema), Box<dyn std::error::Error>> {
    // Fail with the same status as `plan` before touching anything.
    resolve(spec, from, to)?;

    let mut schema = MemorySchema::at_version(spec.min_version());
    let replay = resolve(spec, spec.min_version(), from)?;
    schema.apply_all(replay, from)?;

    let mut version = MemorySchema::at_version(from);
    let outcome = migrate(spec, &mut version, &mut schema, to)?;
    Ok((outcome, schema))
}

fn resolve(
    spec: &MigrationSpec,
    from: SchemaVersion,
    to: SchemaVersion,
) -> std::result::Result<Vec<&MigrationStep>, Unsupported> {
    steps_for_migration(spec, from, to).ok_or(Unsupported {
        from,
        to,
        min: spec.min_version(),
        max: spec.max_version(),
    })
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Tables a migration touches, in first-touch order.
fn touched_tables(migration: &Migration) -> Vec<&str> {
    let mut seen = HashSet::new();
    migration
        .steps
        .iter()
        .map(MigrationStep::table)
        .filter(|table| seen.insert(*table))
        .collect()
}

fn describe(step: &MigrationStep) -> String {
    match step {
        MigrationStep::CreateTable { schema } => {
            format!("create table {} ({} columns)", schema.name(), schema.len())
        }
        MigrationStep::AddColumns { table, columns } => {
            let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
            format!("add {} to {table}", names.join(", "))
        }
        MigrationStep::DestroyColumn { table, column } => format!("drop {table}.{column}"),
        MigrationStep::RenameColumn { table, from, to } => {
            format!("rename {table}.{from} to {to}")
        }
        MigrationStep::DestroyTable { table } => format!("drop table {table}"),
        MigrationStep::MakeColumnOptional { table, column } => {
            format!("make {table}.{column} optional")
        }
        MigrationStep::MakeColumnRequired { table, column, .. } => {
            format!("make {table}.{column} required")
        }
    }
}
