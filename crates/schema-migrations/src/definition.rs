//! Loading migration definitions from TOML or JSON.
//!
//! A definitions file lists migrations in the constructor-input shape:
//!
//! ```toml
//! [[migrations]]
//! toVersion = 2
//!
//! [[migrations.steps]]
//! type = "add_columns"
//! table = "posts"
//! columns = [{ name = "subtitle", type = "string", isOptional = true }]
//! ```
//!
//! JSON uses the same keys; a bare top-level array of migrations is also
//! accepted. Documents are read into [`serde_json::Value`] first so both
//! formats go through the same checks.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::column::ColumnValue;
use crate::error::MigrationError;
use crate::spec::{schema_migrations, Migration, MigrationSpec};
use crate::step::{
    add_columns, create_table, destroy_column, destroy_table, make_column_optional,
    make_column_required, rename_column, AddColumnsArgs, ColumnArgs, CreateTableArgs,
    DestroyColumnArgs, DestroyTableArgs, MakeColumnOptionalArgs, MakeColumnRequiredArgs,
    MigrationStep, RenameColumnArgs, StepKind,
};
use crate::{SchemaVersion, MIN_MIGRATION_VERSION};

/// Error loading a definitions file.
#[derive(Debug)]
pub enum DefinitionError {
    /// Failed to read the file.
    Io(std::io::Error),
    /// The document is not valid TOML / JSON.
    Parse(String),
    /// The document parsed but describes invalid migrations.
    Invalid(MigrationError),
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DefinitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Invalid(e) => Some(e),
            Self::Parse(_) => None,
        }
    }
}

impl From<MigrationError> for DefinitionError {
    fn from(e: MigrationError) -> Self {
        Self::Invalid(e)
    }
}

/// Read a definitions file. `.json` files are parsed as JSON, anything else as TOML.
pub fn load(path: &Path) -> Result<MigrationSpec, DefinitionError> {
    let content = std::fs::read_to_string(path).map_err(DefinitionError::Io)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let result = if is_json {
        migrations_from_json(&content)
    } else {
        migrations_from_toml(&content)
    };
    if let Err(e) = &result {
        log::error!("failed to load migrations from {}: {e}", path.display());
    }
    result
}

/// Parse a TOML document and build the spec.
pub fn migrations_from_toml(content: &str) -> Result<MigrationSpec, DefinitionError> {
    let value: Value = toml::from_str(content).map_err(|e| DefinitionError::Parse(e.to_string()))?;
    Ok(migrations_from_value(&value)?)
}

/// Parse a JSON document and build the spec.
pub fn migrations_from_json(content: &str) -> Result<MigrationSpec, DefinitionError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| DefinitionError::Parse(e.to_string()))?;
    Ok(migrations_from_value(&value)?)
}

/// Build a spec from `{ "migrations": [...] }` or a bare array.
pub fn migrations_from_value(value: &Value) -> Result<MigrationSpec, MigrationError> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(obj) => match obj.get("migrations") {
            Some(Value::Array(entries)) => entries,
            None => return schema_migrations(Vec::new()),
            Some(_) => {
                return Err(MigrationError::MalformedMigration {
                    index: 0,
                    reason: "`migrations` must be an array".into(),
                })
            }
        },
        _ => {
            return Err(MigrationError::MalformedMigration {
                index: 0,
                reason: "expected a table with a `migrations` array".into(),
            })
        }
    };

    let migrations = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| migration_from_value(index, entry))
        .collect::<Result<Vec<_>, _>>()?;
    schema_migrations(migrations)
}

/// Convert one `{ toVersion, steps }` entry.
pub fn migration_from_value(index: usize, value: &Value) -> Result<Migration, MigrationError> {
    let malformed = |reason: &str| MigrationError::MalformedMigration {
        index,
        reason: reason.to_string(),
    };

    let obj = value
        .as_object()
        .ok_or_else(|| malformed("expected an object"))?;
    let to_version = obj
        .get("toVersion")
        .and_then(Value::as_i64)
        .ok_or_else(|| malformed("`toVersion` must be an integer"))?;
    let raw_steps = obj
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("`steps` must be an array"))?;

    // Tag problems are reported before field problems.
    let display_version = SchemaVersion::try_from(to_version).unwrap_or_default();
    for (step_index, raw) in raw_steps.iter().enumerate() {
        if let Err(tag) = step_kind(raw) {
            return Err(MigrationError::MalformedStep {
                to_version: display_version,
                index: step_index,
                tag,
            });
        }
    }

    if to_version < i64::from(MIN_MIGRATION_VERSION) {
        return Err(MigrationError::VersionRange { to_version });
    }
    let to_version =
        SchemaVersion::try_from(to_version).map_err(|_| malformed("`toVersion` is too large"))?;

    let steps = raw_steps
        .iter()
        .map(step_from_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Migration::new(to_version, steps))
}

/// Convert one loosely-typed step by dispatching on its `type` tag.
pub fn step_from_value(value: &Value) -> Result<MigrationStep, MigrationError> {
    let kind = step_kind(value).map_err(|tag| MigrationError::UnknownStepType { tag })?;
    // step_kind only succeeds on objects
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    match kind {
        StepKind::CreateTable => create_table(CreateTableArgs {
            name: string_field(obj, kind, "name")?,
            columns: columns_field(obj, kind)?,
        }),
        StepKind::AddColumns => add_columns(AddColumnsArgs {
            table: string_field(obj, kind, "table")?,
            columns: columns_field(obj, kind)?,
        }),
        StepKind::DestroyColumn => destroy_column(DestroyColumnArgs {
            table: string_field(obj, kind, "table")?,
            column: string_field(obj, kind, "column")?,
        }),
        StepKind::RenameColumn => rename_column(RenameColumnArgs {
            table: string_field(obj, kind, "table")?,
            from: string_field(obj, kind, "from")?,
            to: string_field(obj, kind, "to")?,
        }),
        StepKind::DestroyTable => destroy_table(DestroyTableArgs {
            table: string_field(obj, kind, "table")?,
        }),
        StepKind::MakeColumnOptional => make_column_optional(MakeColumnOptionalArgs {
            table: string_field(obj, kind, "table")?,
            column: string_field(obj, kind, "column")?,
        }),
        StepKind::MakeColumnRequired => make_column_required(MakeColumnRequiredArgs {
            table: string_field(obj, kind, "table")?,
            column: string_field(obj, kind, "column")?,
            default_value: default_value_field(obj, kind)?,
        }),
    }
}

/// The step's kind, or the unrecognized tag (if any) on failure.
fn step_kind(value: &Value) -> Result<StepKind, Option<String>> {
    let tag = value
        .as_object()
        .and_then(|obj| obj.get("type"))
        .ok_or(None)?;
    let tag = tag.as_str().ok_or_else(|| Some(tag.to_string()))?;
    StepKind::from_tag(tag).ok_or_else(|| Some(tag.to_string()))
}

fn string_field(
    obj: &Map<String, Value>,
    step: StepKind,
    field: &'static str,
) -> Result<Option<String>, MigrationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(MigrationError::MalformedField { step, field }),
    }
}

fn bool_field(
    obj: &Map<String, Value>,
    step: StepKind,
    field: &'static str,
) -> Result<bool, MigrationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(MigrationError::MalformedField { step, field }),
    }
}

fn columns_field(
    obj: &Map<String, Value>,
    step: StepKind,
) -> Result<Option<Vec<ColumnArgs>>, MigrationError> {
    let malformed = MigrationError::MalformedField {
        step,
        field: "columns",
    };
    let items = match obj.get("columns") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(malformed),
    };
    items
        .iter()
        .map(|item| -> Result<ColumnArgs, MigrationError> {
            let column = item.as_object().ok_or_else(|| malformed.clone())?;
            Ok(ColumnArgs {
                name: string_field(column, step, "name")?,
                column_type: string_field(column, step, "type")?,
                is_optional: bool_field(column, step, "isOptional")?,
                is_indexed: bool_field(column, step, "isIndexed")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn default_value_field(
    obj: &Map<String, Value>,
    step: StepKind,
) -> Result<Option<ColumnValue>, MigrationError> {
    let value = match obj.get("defaultValue") {
        None => return Ok(None),
        Some(Value::Null) => ColumnValue::Null,
        Some(Value::Bool(b)) => ColumnValue::Bool(*b),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(ColumnValue::Number)
            .ok_or(MigrationError::MalformedField {
                step,
                field: "defaultValue",
            })?,
        Some(Value::String(s)) => ColumnValue::String(s.clone()),
        Some(_) => {
            return Err(MigrationError::MalformedField {
                step,
                field: "defaultValue",
            })
        }
    };
    Ok(Some(value))
}
