use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{column::Function, data_type::DataType};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("table {0:?} not found in the database")]
    TableNotFound(String),

    #[error("column {table}.{column} not found in the result set")]
    ColumnNotFound { table: String, column: String },

    #[error("table's data file {path:?} could not be opened: {source}")]
    DataFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("row {row} is out of bounds (result set has {rows} rows)")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("column {column} is out of bounds (result set has {columns} columns)")]
    ColumnOutOfBounds { column: usize, columns: usize },

    #[error("column {column} has type {actual}, not {expected}")]
    TypeMismatch {
        column: usize,
        expected: DataType,
        actual: DataType,
    },

    #[error("{function} cannot be applied to a {data_type} column")]
    InvalidAggregate {
        function: Function,
        data_type: DataType,
    },

    #[error("failed writing results: {0}")]
    Output(#[source] io::Error),

    /// Catalog or query descriptor that could not be read or decoded.
    #[error("invalid input: {0}")]
    Input(String),
}

impl Error {
    /// Returns `true` for broken preconditions that must halt the process.
    ///
    /// Only catalog and query decoding problems are recoverable; everything
    /// else means the validated query or the data file does not match the
    /// metadata the executor was given.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Input(_))
    }
}
