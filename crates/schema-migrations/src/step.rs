//! Structural migration steps and the constructors that validate them.
//!
//! Each constructor takes a loosely-populated `*Args` value (every field is
//! optional, as it would be when read from a definitions file) and returns a
//! canonical [`MigrationStep`] or the first validation failure.

use std::fmt;

use serde::Serialize;

use crate::column::{ColumnSchema, ColumnType, ColumnValue, TableSchema};
use crate::error::{MigrationError, Result};
use crate::name::validate_name;

/// The tag of a [`MigrationStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// `create_table`
    CreateTable,
    /// `add_columns`
    AddColumns,
    /// `destroy_column`
    DestroyColumn,
    /// `rename_column`
    RenameColumn,
    /// `destroy_table`
    DestroyTable,
    /// `make_column_optional`
    MakeColumnOptional,
    /// `make_column_required`
    MakeColumnRequired,
}

impl StepKind {
    /// All kinds, in declaration order.
    pub const ALL: [StepKind; 7] = [
        Self::CreateTable,
        Self::AddColumns,
        Self::DestroyColumn,
        Self::RenameColumn,
        Self::DestroyTable,
        Self::MakeColumnOptional,
        Self::MakeColumnRequired,
    ];

    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTable => "create_table",
            Self::AddColumns => "add_columns",
            Self::DestroyColumn => "destroy_column",
            Self::RenameColumn => "rename_column",
            Self::DestroyTable => "destroy_table",
            Self::MakeColumnOptional => "make_column_optional",
            Self::MakeColumnRequired => "make_column_required",
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic structural change to a table or column.
///
/// Serializes to the tagged record shape consumed by executors, e.g.
/// `{ "type": "rename_column", "table": "comments", "from": "text", "to": "body" }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MigrationStep {
    /// Create a new table.
    CreateTable { schema: TableSchema },
    /// Append columns to an existing table.
    AddColumns {
        table: String,
        columns: Vec<ColumnSchema>,
    },
    /// Drop a column.
    DestroyColumn { table: String, column: String },
    /// Rename a column.
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    /// Drop a table.
    DestroyTable { table: String },
    /// Allow null in a column.
    MakeColumnOptional { table: String, column: String },
    /// Disallow null in a column, filling existing nulls with `default_value`.
    MakeColumnRequired {
        table: String,
        column: String,
        #[serde(rename = "defaultValue")]
        default_value: ColumnValue,
    },
}

impl MigrationStep {
    /// The step's tag.
    pub fn kind(&self) -> StepKind {
        match self {
            Self::CreateTable { .. } => StepKind::CreateTable,
            Self::AddColumns { .. } => StepKind::AddColumns,
            Self::DestroyColumn { .. } => StepKind::DestroyColumn,
            Self::RenameColumn { .. } => StepKind::RenameColumn,
            Self::DestroyTable { .. } => StepKind::DestroyTable,
            Self::MakeColumnOptional { .. } => StepKind::MakeColumnOptional,
            Self::MakeColumnRequired { .. } => StepKind::MakeColumnRequired,
        }
    }

    /// The table this step touches.
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { schema } => schema.name(),
            Self::AddColumns { table, .. }
            | Self::DestroyColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::DestroyTable { table }
            | Self::MakeColumnOptional { table, .. }
            | Self::MakeColumnRequired { table, .. } => table,
        }
    }

    /// Re-check the invariants the constructors enforce.
    ///
    /// Steps built through the constructors always pass. Variants assembled
    /// by hand are held to the same rules when a spec is built.
    pub fn validate(&self) -> Result<()> {
        let kind = self.kind();
        match self {
            // TableSchema can only be built through its checked constructor.
            Self::CreateTable { .. } => Ok(()),
            Self::AddColumns { table, columns } => {
                require(kind, "table", table)?;
                validate_name(table)?;
                for column in columns {
                    validate_name(&column.name)?;
                }
                Ok(())
            }
            Self::RenameColumn { table, from, to } => {
                require(kind, "table", table)?;
                require(kind, "from", from)?;
                require(kind, "to", to)?;
                validate_name(to)?;
                Ok(())
            }
            Self::DestroyColumn { table, column }
            | Self::MakeColumnOptional { table, column }
            | Self::MakeColumnRequired { table, column, .. } => {
                require(kind, "table", table)?;
                require(kind, "column", column)?;
                Ok(())
            }
            Self::DestroyTable { table } => require(kind, "table", table),
        }
    }
}

/// Loose column input: name and type as written, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnArgs {
    pub name: Option<String>,
    pub column_type: Option<String>,
    pub is_optional: bool,
    pub is_indexed: bool,
}

impl ColumnArgs {
    /// A fully-populated column input.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            column_type: Some(column_type.into()),
            ..Self::default()
        }
    }

    /// Mark the column as nullable.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Mark the column as indexed.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }
}

/// Input to [`create_table`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTableArgs {
    pub name: Option<String>,
    pub columns: Option<Vec<ColumnArgs>>,
}

impl CreateTableArgs {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnArgs>) -> Self {
        Self {
            name: Some(name.into()),
            columns: Some(columns),
        }
    }
}

/// Input to [`add_columns`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddColumnsArgs {
    pub table: Option<String>,
    pub columns: Option<Vec<ColumnArgs>>,
}

impl AddColumnsArgs {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnArgs>) -> Self {
        Self {
            table: Some(table.into()),
            columns: Some(columns),
        }
    }
}

/// Input to [`destroy_column`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestroyColumnArgs {
    pub table: Option<String>,
    pub column: Option<String>,
}

impl DestroyColumnArgs {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: Some(column.into()),
        }
    }
}

/// Input to [`rename_column`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenameColumnArgs {
    pub table: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RenameColumnArgs {
    pub fn new(table: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            from: Some(from.into()),
            to: Some(to.into()),
        }
    }
}

/// Input to [`destroy_table`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestroyTableArgs {
    pub table: Option<String>,
}

impl DestroyTableArgs {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
        }
    }
}

/// Input to [`make_column_optional`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MakeColumnOptionalArgs {
    pub table: Option<String>,
    pub column: Option<String>,
}

impl MakeColumnOptionalArgs {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: Some(column.into()),
        }
    }
}

/// Input to [`make_column_required`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MakeColumnRequiredArgs {
    pub table: Option<String>,
    pub column: Option<String>,
    pub default_value: Option<ColumnValue>,
}

impl MakeColumnRequiredArgs {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        default_value: impl Into<ColumnValue>,
    ) -> Self {
        Self {
            table: Some(table.into()),
            column: Some(column.into()),
            default_value: Some(default_value.into()),
        }
    }
}

/// Create a table.
///
/// # Example
///
/// ```
/// use schema_migrations::{create_table, ColumnArgs, CreateTableArgs};
///
/// let step = create_table(CreateTableArgs::new(
///     "comments",
///     vec![
///         ColumnArgs::new("post_id", "string").indexed(),
///         ColumnArgs::new("body", "string"),
///     ],
/// ))
/// .unwrap();
/// assert_eq!(step.table(), "comments");
///
/// let bad = CreateTableArgs::new("foo", vec![ColumnArgs::new("x", "blah")]);
/// assert!(create_table(bad).unwrap_err().to_string().contains("type"));
/// ```
pub fn create_table(args: CreateTableArgs) -> Result<MigrationStep> {
    let kind = StepKind::CreateTable;
    let name = take(kind, "name", args.name)?;
    let columns = args
        .columns
        .filter(|columns| !columns.is_empty())
        .ok_or(MigrationError::MalformedField {
            step: kind,
            field: "columns",
        })?;
    let columns = column_schemas(kind, columns)?;
    let schema = TableSchema::new(name, columns)?;
    Ok(MigrationStep::CreateTable { schema })
}

/// Add columns to an existing table.
pub fn add_columns(args: AddColumnsArgs) -> Result<MigrationStep> {
    let kind = StepKind::AddColumns;
    let table = take(kind, "table", args.table)?;
    let columns = args.columns.ok_or(MigrationError::MalformedField {
        step: kind,
        field: "columns",
    })?;
    validate_name(&table)?;
    let columns = column_schemas(kind, columns)?;
    Ok(MigrationStep::AddColumns { table, columns })
}

/// Drop a column from a table.
pub fn destroy_column(args: DestroyColumnArgs) -> Result<MigrationStep> {
    let kind = StepKind::DestroyColumn;
    let table = take(kind, "table", args.table)?;
    let column = take(kind, "column", args.column)?;
    Ok(MigrationStep::DestroyColumn { table, column })
}

/// Rename a column. Only the new name is checked for safety.
pub fn rename_column(args: RenameColumnArgs) -> Result<MigrationStep> {
    let kind = StepKind::RenameColumn;
    let table = take(kind, "table", args.table)?;
    let from = take(kind, "from", args.from)?;
    let to = take(kind, "to", args.to)?;
    validate_name(&to)?;
    Ok(MigrationStep::RenameColumn { table, from, to })
}

/// Drop a table.
pub fn destroy_table(args: DestroyTableArgs) -> Result<MigrationStep> {
    let table = take(StepKind::DestroyTable, "table", args.table)?;
    Ok(MigrationStep::DestroyTable { table })
}

/// Make a column nullable.
pub fn make_column_optional(args: MakeColumnOptionalArgs) -> Result<MigrationStep> {
    let kind = StepKind::MakeColumnOptional;
    let table = take(kind, "table", args.table)?;
    let column = take(kind, "column", args.column)?;
    Ok(MigrationStep::MakeColumnOptional { table, column })
}

/// Make a column non-nullable, back-filling nulls with the default value.
pub fn make_column_required(args: MakeColumnRequiredArgs) -> Result<MigrationStep> {
    let kind = StepKind::MakeColumnRequired;
    let table = take(kind, "table", args.table)?;
    let column = take(kind, "column", args.column)?;
    let default_value = args.default_value.ok_or(MigrationError::MalformedField {
        step: kind,
        field: "defaultValue",
    })?;
    Ok(MigrationStep::MakeColumnRequired {
        table,
        column,
        default_value,
    })
}

/// Unwrap a required string field. Empty counts as missing.
fn take(step: StepKind, field: &'static str, value: Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(MigrationError::MalformedField { step, field }),
    }
}

fn require(step: StepKind, field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MigrationError::MalformedField { step, field });
    }
    Ok(())
}

fn column_schemas(step: StepKind, columns: Vec<ColumnArgs>) -> Result<Vec<ColumnSchema>> {
    columns
        .into_iter()
        .map(|args| column_schema(step, args))
        .collect()
}

fn column_schema(step: StepKind, args: ColumnArgs) -> Result<ColumnSchema> {
    let name = take(step, "name", args.name)?;
    let raw_type = take(step, "type", args.column_type)?;
    validate_name(&name)?;
    let column_type: ColumnType =
        raw_type
            .parse()
            .map_err(|()| MigrationError::InvalidColumnType {
                column: name.clone(),
                column_type: raw_type.clone(),
            })?;
    Ok(ColumnSchema {
        name,
        column_type,
        is_optional: args.is_optional,
        is_indexed: args.is_indexed,
    })
}
