use std::collections::BTreeMap;
use std::fmt;

use crate::column::TableSchema;
use crate::runner::{StepExecutor, VersionStore};
use crate::step::MigrationStep;
use crate::{SchemaVersion, INITIAL_SCHEMA_VERSION};

/// In-memory schema backend.
///
/// Keeps table shapes in a `BTreeMap` and applies steps to them directly.
/// Nothing touches disk; ideal for testing plans and prototyping.
///
/// # Example
///
/// ```
/// use schema_migrations::{
///     create_table, schema_migrations, steps_for_migration, ColumnArgs, CreateTableArgs,
///     MemorySchema, Migration,
/// };
///
/// let spec = schema_migrations(vec![Migration::new(
///     2,
///     vec![create_table(CreateTableArgs::new("posts", vec![ColumnArgs::new("title", "string")]))
///         .unwrap()],
/// )])
/// .unwrap();
///
/// let mut schema = MemorySchema::new();
/// let steps = steps_for_migration(&spec, 1, 2).unwrap();
/// schema.apply_all(steps, 2).unwrap();
/// assert!(schema.table("posts").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySchema {
    version: SchemaVersion,
    tables: BTreeMap<String, TableSchema>,
}

/// Error applying a step to a [`MemorySchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemorySchemaError {
    /// `create_table` on a table that already exists.
    TableExists(String),
    /// The step names a table that does not exist.
    UnknownTable(String),
    /// The step would add or rename onto an existing column.
    ColumnExists { table: String, column: String },
    /// The step names a column that does not exist.
    UnknownColumn { table: String, column: String },
}

impl fmt::Display for MemorySchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableExists(table) => write!(f, "table `{table}` already exists"),
            Self::UnknownTable(table) => write!(f, "table `{table}` does not exist"),
            Self::ColumnExists { table, column } => {
                write!(f, "column `{table}.{column}` already exists")
            }
            Self::UnknownColumn { table, column } => {
                write!(f, "column `{table}.{column}` does not exist")
            }
        }
    }
}

impl std::error::Error for MemorySchemaError {}

impl MemorySchema {
    /// An empty schema at version 1.
    pub fn new() -> Self {
        Self::at_version(INITIAL_SCHEMA_VERSION)
    }

    /// An empty schema claiming to be at `version`.
    pub fn at_version(version: SchemaVersion) -> Self {
        Self {
            version,
            tables: BTreeMap::new(),
        }
    }

    /// Look up a table.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Tables, ordered by name.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// Apply `steps` in order, then record `version`.
    pub fn apply_all<'a>(
        &mut self,
        steps: impl IntoIterator<Item = &'a MigrationStep>,
        version: SchemaVersion,
    ) -> Result<(), MemorySchemaError> {
        for step in steps {
            self.apply(step)?;
        }
        self.version = version;
        Ok(())
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut TableSchema, MemorySchemaError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| MemorySchemaError::UnknownTable(table.to_string()))
    }
}

impl Default for MemorySchema {
    fn default() -> Self {
        Self::new()
    }
}

impl StepExecutor for MemorySchema {
    type Error = MemorySchemaError;

    fn apply(&mut self, step: &MigrationStep) -> Result<(), Self::Error> {
        match step {
            MigrationStep::CreateTable { schema } => {
                if self.tables.contains_key(schema.name()) {
                    return Err(MemorySchemaError::TableExists(schema.name().to_string()));
                }
                self.tables
                    .insert(schema.name().to_string(), schema.clone());
            }
            MigrationStep::AddColumns { table, columns } => {
                let current = self.table_mut(table)?;
                let mut next = current.column_array().to_vec();
                for column in columns {
                    if next.iter().any(|c| c.name == column.name) {
                        return Err(MemorySchemaError::ColumnExists {
                            table: table.clone(),
                            column: column.name.clone(),
                        });
                    }
                    next.push(column.clone());
                }
                *current = current.with_columns(next);
            }
            MigrationStep::DestroyColumn { table, column } => {
                let current = self.table_mut(table)?;
                require_column(current, column)?;
                let next = current
                    .column_array()
                    .iter()
                    .filter(|c| &c.name != column)
                    .cloned()
                    .collect();
                *current = current.with_columns(next);
            }
            MigrationStep::RenameColumn { table, from, to } => {
                let current = self.table_mut(table)?;
                require_column(current, from)?;
                if current.contains_column(to) {
                    return Err(MemorySchemaError::ColumnExists {
                        table: table.clone(),
                        column: to.clone(),
                    });
                }
                let next = current
                    .column_array()
                    .iter()
                    .cloned()
                    .map(|mut c| {
                        if &c.name == from {
                            c.name = to.clone();
                        }
                        c
                    })
                    .collect();
                *current = current.with_columns(next);
            }
            MigrationStep::DestroyTable { table } => {
                self.tables
                    .remove(table)
                    .ok_or_else(|| MemorySchemaError::UnknownTable(table.clone()))?;
            }
            MigrationStep::MakeColumnOptional { table, column } => {
                set_optional(self.table_mut(table)?, column, true)?;
            }
            MigrationStep::MakeColumnRequired { table, column, .. } => {
                set_optional(self.table_mut(table)?, column, false)?;
            }
        }
        Ok(())
    }
}

impl VersionStore for MemorySchema {
    type Error = MemorySchemaError;

    fn current_version(&self) -> Result<SchemaVersion, Self::Error> {
        Ok(self.version)
    }

    fn set_version(&mut self, version: SchemaVersion) -> Result<(), Self::Error> {
        self.version = version;
        Ok(())
    }
}

fn require_column(table: &TableSchema, column: &str) -> Result<(), MemorySchemaError> {
    if table.contains_column(column) {
        Ok(())
    } else {
        Err(MemorySchemaError::UnknownColumn {
            table: table.name().to_string(),
            column: column.to_string(),
        })
    }
}

fn set_optional(
    table: &mut TableSchema,
    column: &str,
    is_optional: bool,
) -> Result<(), MemorySchemaError> {
    require_column(table, column)?;
    let next = table
        .column_array()
        .iter()
        .cloned()
        .map(|mut c| {
            if c.name == column {
                c.is_optional = is_optional;
            }
            c
        })
        .collect();
    *table = table.with_columns(next);
    Ok(())
}
