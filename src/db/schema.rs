//! Static schema descriptions for prompt construction.
//!
//! The catalog maps a table name to a human-readable description of each of
//! its fields. It is loaded once at startup and never mutated; the query
//! synthesizer embeds the description of the target table in its prompt.

use crate::error::{Result, Text2SqlError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptions shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

/// A single field of a described table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Column name as it appears in the database.
    pub name: String,
    /// What the column holds, including its SQL type.
    pub description: String,
}

impl FieldDescription {
    /// Creates a new field description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Description of one table: its kind and its fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Kind of relation, e.g. "PostgreSQL Table".
    #[serde(default = "default_data_type")]
    pub data_type: String,

    /// Field descriptions, in the order they are presented to the model.
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
}

fn default_data_type() -> String {
    "PostgreSQL Table".to_string()
}

impl TableDescriptor {
    /// Creates a descriptor for a PostgreSQL table with the given fields.
    pub fn new(fields: Vec<FieldDescription>) -> Self {
        Self {
            data_type: default_data_type(),
            fields,
        }
    }

    /// Formats the fields for inclusion in an LLM system prompt.
    ///
    /// Produces an indented JSON object, one `"name": "description"` pair per
    /// line, preserving field order.
    pub fn format_for_llm(&self) -> String {
        if self.fields.is_empty() {
            return "{}".to_string();
        }

        let lines = self
            .fields
            .iter()
            .map(|field| {
                format!(
                    "  {}: {}",
                    serde_json::Value::from(field.name.as_str()),
                    serde_json::Value::from(field.description.as_str())
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!("{{\n{lines}\n}}")
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tables: HashMap<String, TableDescriptor>,
}

/// Read-only mapping from table name to its descriptor.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: HashMap<String, TableDescriptor>,
}

impl SchemaCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the descriptions shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Parses a catalog from TOML with `[tables.<name>]` sections.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| Text2SqlError::config(format!("Invalid table catalog: {e}")))?;
        Ok(Self { tables: file.tables })
    }

    /// Adds a table, replacing any existing description with the same name.
    pub fn with_table(mut self, name: impl Into<String>, table: TableDescriptor) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Adds every table from `tables`, replacing entries with the same name.
    pub fn extend(&mut self, tables: impl IntoIterator<Item = (String, TableDescriptor)>) {
        self.tables.extend(tables);
    }

    /// Looks up the descriptor for `table_name`.
    ///
    /// An unknown table is a configuration error: no prompt can be built for it.
    pub fn lookup(&self, table_name: &str) -> Result<&TableDescriptor> {
        self.tables.get(table_name).ok_or_else(|| {
            Text2SqlError::config(format!(
                "Table '{table_name}' is not registered in the schema catalog"
            ))
        })
    }

    /// Returns the registered table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
