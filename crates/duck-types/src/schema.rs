//! Table schema definitions loaded from YAML.
//!
//! A schema file lists tables and the logical type of each column:
//!
//! ```yaml
//! tables:
//!   - name: events
//!     columns:
//!       - name: id
//!         type: bigint
//!       - name: price
//!         type: { type: decimal, width: 10, scale: 2 }
//! ```
//!
//! Column types are validated while the file is parsed; tables assembled in
//! code are validated when added to a [`DatabaseSchema`].

use crate::types::LogicalType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML (including invalid type trees)
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found in table schema
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Column type of a table built in code failed validation
    #[error("Column '{column}' in table '{table}' has an invalid type: {source}")]
    InvalidType {
        table: String,
        column: String,
        #[source]
        source: crate::types::TypeError,
    },
}

/// Column definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub column_type: LogicalType,
}

impl ColumnDefinition {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, column_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Table definition: ordered columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDefinition {
    /// Table name
    pub name: String,

    /// Column definitions in row order
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create a new table definition.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get the type of a column by name.
    pub fn get_column_type(&self, name: &str) -> Option<&LogicalType> {
        self.get_column(name).map(|c| &c.column_type)
    }

    /// Column types in row order.
    pub fn column_types(&self) -> Vec<LogicalType> {
        self.columns.iter().map(|c| c.column_type.clone()).collect()
    }

    /// Get all column names in row order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Validate every column type.
    ///
    /// Tables parsed from YAML are already valid; this covers tables put
    /// together with [`TableDefinition::new`].
    pub fn validate(&self) -> Result<(), SchemaError> {
        for column in &self.columns {
            column
                .column_type
                .validate()
                .map_err(|source| SchemaError::InvalidType {
                    table: self.name.clone(),
                    column: column.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Database schema (collection of tables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    /// Table definitions
    pub tables: Vec<TableDefinition>,

    /// Cached table lookup (not serialized)
    #[serde(skip)]
    table_map: HashMap<String, usize>,
}

impl DatabaseSchema {
    /// Create a new database schema from a list of table definitions.
    pub fn new(tables: Vec<TableDefinition>) -> Self {
        let mut schema = Self {
            tables,
            table_map: HashMap::new(),
        };
        schema.build_table_map();
        schema
    }

    /// Load a schema from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a schema from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        // Column types validate themselves while deserializing
        let mut schema: DatabaseSchema = serde_yaml::from_str(yaml)?;
        schema.build_table_map();
        Ok(schema)
    }

    /// Build the internal table lookup map.
    fn build_table_map(&mut self) {
        self.table_map = self
            .tables
            .iter()
            .enumerate()
            .map(|(idx, table)| (table.name.clone(), idx))
            .collect();
    }

    /// Get a table schema by name.
    pub fn get_table(&self, name: &str) -> Option<&TableDefinition> {
        self.table_map
            .get(name)
            .and_then(|&idx| self.tables.get(idx))
    }

    /// Get a table schema by name, as an error if missing.
    pub fn require_table(&self, name: &str) -> Result<&TableDefinition, SchemaError> {
        self.get_table(name)
            .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))
    }

    /// Get the type of a column in a specific table.
    pub fn get_column_type(&self, table: &str, column: &str) -> Result<&LogicalType, SchemaError> {
        let table_schema = self.require_table(table)?;

        table_schema
            .get_column_type(column)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// Get all table names in the schema.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Add a table to the schema after validating its column types.
    pub fn add_table(&mut self, table: TableDefinition) -> Result<(), SchemaError> {
        table.validate()?;
        let idx = self.tables.len();
        self.table_map.insert(table.name.clone(), idx);
        self.tables.push(table);
        Ok(())
    }
}
