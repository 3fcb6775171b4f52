use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{MigrationError, Result};
use crate::name::validate_name;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Text.
    String,
    /// Numeric (integer or floating point).
    Number,
    /// True / false.
    Boolean,
}

impl ColumnType {
    /// The textual form used in definitions and step records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            _ => Err(()),
        }
    }
}

/// A single column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Column storage type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column accepts null.
    #[serde(skip_serializing_if = "is_false")]
    pub is_optional: bool,
    /// Whether the storage engine should index the column.
    #[serde(skip_serializing_if = "is_false")]
    pub is_indexed: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl ColumnSchema {
    /// A required, non-indexed column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            is_optional: false,
            is_indexed: false,
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

/// Default value written into existing rows when a column becomes required.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    /// Null.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(f64),
    /// String literal (may be empty).
    String(String),
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// The full shape of a table.
///
/// Columns are held once, in declaration order. The by-name lookup is
/// derived from that list when the schema is built and is never edited on
/// its own, so [`column_array`](Self::column_array) and
/// [`column`](Self::column) always describe the same set.
///
/// Serializes as `{ name, columns: { name -> column }, columnArray: [...] }`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    column_array: Vec<ColumnSchema>,
    index: HashMap<String, usize>,
}

impl TableSchema {
    /// Build a table schema, checking the table name and every column name
    /// and rejecting duplicate columns.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        for column in &columns {
            validate_name(&column.name)?;
        }
        let index = index_columns(&columns).map_err(|column| MigrationError::DuplicateColumn {
            table: name.clone(),
            column,
        })?;
        Ok(Self {
            name,
            column_array: columns,
            index,
        })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn column_array(&self) -> &[ColumnSchema] {
        &self.column_array
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.index.get(name).map(|&i| &self.column_array[i])
    }

    /// Check whether a column exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// `(name, column)` pairs in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnSchema)> {
        self.column_array.iter().map(|c| (c.name.as_str(), c))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.column_array.len()
    }

    /// Whether the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.column_array.is_empty()
    }

    /// Same table with a replaced column list. Callers guarantee unique names.
    pub(crate) fn with_columns(&self, column_array: Vec<ColumnSchema>) -> Self {
        let index = column_array
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            name: self.name.clone(),
            column_array,
            index,
        }
    }
}

/// Returns the name of the first duplicate on failure.
fn index_columns(columns: &[ColumnSchema]) -> std::result::Result<HashMap<String, usize>, String> {
    let mut index = HashMap::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        if index.insert(column.name.clone(), i).is_some() {
            return Err(column.name.clone());
        }
    }
    Ok(index)
}

struct ColumnMap<'a>(&'a [ColumnSchema]);

impl Serialize for ColumnMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|c| (&c.name, c)))
    }
}

impl Serialize for TableSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TableSchema", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("columns", &ColumnMap(&self.column_array))?;
        state.serialize_field("columnArray", &self.column_array)?;
        state.end()
    }
}
