use serde::Deserialize;

use crate::data_type::DataType;

/// Column definition in the table metadata
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Metadata of a table stored as a flat data file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableMeta {
    pub name: String,
    /// Size of one record in bytes, terminator included.
    #[serde(default)]
    pub record_size: usize,
    pub columns: Vec<ColumnDef>,
}

impl TableMeta {
    pub fn new(name: impl Into<String>, record_size: usize, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            record_size,
            columns,
        }
    }

    /// Declared column types, in definition order.
    pub fn column_types(&self) -> Vec<DataType> {
        self.columns.iter().map(|column| column.data_type).collect()
    }

    /// Case-insensitive column lookup.
    pub fn get_col(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }
}
