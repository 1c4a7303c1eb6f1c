use std::{
    fmt,
    io::{self, Write},
};

use tracing::trace;

use crate::{
    column::{Column, ColumnMeta, Function},
    data_type::DataType,
    error::{Error, Result},
    value::Value,
};

/// In-memory table produced while executing one query.
///
/// Rows and columns are addressed by 1-based positions that stay contiguous
/// after every mutation: removing row 3 of 5 turns rows 4 and 5 into rows 3
/// and 4, and the same holds for columns. Every column always holds exactly
/// `num_rows` cells.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<Column>,
    num_rows: usize,
}

impl ResultSet {
    /// Creates an empty result set with no rows and no columns.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column descriptors in on-screen order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter().map(|column| &column.meta)
    }

    /// Descriptor of the column at position `col`.
    pub fn column(&self, col: usize) -> Result<&ColumnMeta> {
        let idx = self.column_index(col)?;
        Ok(&self.columns[idx].meta)
    }

    /// Inserts a column at `position` (1 to `num_columns + 1`), shifting the
    /// following columns right. Every existing row gets an empty cell for it.
    ///
    /// Returns the position of the new column.
    pub fn insert_column(&mut self, position: usize, meta: ColumnMeta) -> Result<usize> {
        if position == 0 || position > self.columns.len() + 1 {
            return Err(Error::ColumnOutOfBounds {
                column: position,
                columns: self.columns.len(),
            });
        }
        trace!(position, column = %meta.label(), "insert column");
        self.columns
            .insert(position - 1, Column::with_nulls(meta, self.num_rows));
        Ok(position)
    }

    /// Appends a row of empty cells and returns its position.
    pub fn add_row(&mut self) -> usize {
        for column in &mut self.columns {
            column.push_null();
        }
        self.num_rows += 1;
        self.num_rows
    }

    /// Overwrites the cell at (`row`, `col`).
    ///
    /// # Errors
    /// Fails if the position is out of bounds or a non-empty `value` does not
    /// have the column's declared type.
    pub fn put(&mut self, row: usize, col: usize, value: Value) -> Result<()> {
        let row_idx = self.row_index(row)?;
        let col_idx = self.column_index(col)?;
        if let Some(actual) = value.data_type() {
            self.check_type(col_idx, actual)?;
        }
        self.columns[col_idx].set(row_idx, value);
        Ok(())
    }

    pub fn put_int(&mut self, row: usize, col: usize, value: i64) -> Result<()> {
        self.put(row, col, Value::Int(value))
    }

    pub fn put_real(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.put(row, col, Value::Real(value))
    }

    /// Stores a copy of `value`; the caller keeps ownership of its buffer.
    pub fn put_string(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        self.put(row, col, Value::Text(value.into()))
    }

    /// Returns the cell at (`row`, `col`).
    pub fn get(&self, row: usize, col: usize) -> Result<Value> {
        let row_idx = self.row_index(row)?;
        let col_idx = self.column_index(col)?;
        Ok(self.columns[col_idx]
            .get(row_idx)
            .unwrap_or(Value::Null))
    }

    /// Returns the integer at (`row`, `col`), `None` for an empty cell.
    ///
    /// # Errors
    /// Fails if the position is out of bounds or the column is not an int column.
    pub fn get_int(&self, row: usize, col: usize) -> Result<Option<i64>> {
        Ok(self.get_typed(row, col, DataType::Int)?.as_int())
    }

    pub fn get_real(&self, row: usize, col: usize) -> Result<Option<f64>> {
        Ok(self.get_typed(row, col, DataType::Real)?.as_real())
    }

    /// Returns a copy of the string at (`row`, `col`) owned by the caller.
    pub fn get_string(&self, row: usize, col: usize) -> Result<Option<String>> {
        Ok(self
            .get_typed(row, col, DataType::Text)?
            .as_str()
            .map(str::to_owned))
    }

    /// Returns every cell of `row`, in column order.
    pub fn row(&self, row: usize) -> Result<Vec<Value>> {
        (1..=self.columns.len())
            .map(|col| self.get(row, col))
            .collect()
    }

    /// Returns the first column at or after position `start` whose table and
    /// name match case-insensitively.
    pub fn find_column(&self, start: usize, table: &str, name: &str) -> Option<usize> {
        let skip = start.max(1) - 1;
        self.columns
            .iter()
            .enumerate()
            .skip(skip)
            .find(|(_, column)| column.meta.matches(table, name))
            .map(|(idx, _)| idx + 1)
    }

    /// Removes `row`; rows after it move up by one position.
    pub fn delete_row(&mut self, row: usize) -> Result<()> {
        let row_idx = self.row_index(row)?;
        for column in &mut self.columns {
            column.remove(row_idx);
        }
        self.num_rows -= 1;
        Ok(())
    }

    /// Removes the column at `col` together with its cell in every row.
    pub fn delete_column(&mut self, col: usize) -> Result<()> {
        let col_idx = self.column_index(col)?;
        let column = self.columns.remove(col_idx);
        trace!(col, column = %column.meta.label(), "delete column");
        Ok(())
    }

    /// Moves the column at `from` to position `to`; the columns in between
    /// shift by one position to fill the gap.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        let from_idx = self.column_index(from)?;
        let to_idx = self.column_index(to)?;
        if from_idx != to_idx {
            let column = self.columns.remove(from_idx);
            self.columns.insert(to_idx, column);
        }
        Ok(())
    }

    /// Keeps the first `len` rows; a no-op if there are not more than `len`.
    pub fn truncate_rows(&mut self, len: usize) {
        if len >= self.num_rows {
            return;
        }
        for column in &mut self.columns {
            column.truncate(len);
        }
        self.num_rows = len;
    }

    /// Replaces column `col` by the single value of `function` over it.
    ///
    /// The whole result set collapses to one row: the first row of every
    /// other column survives next to the aggregate. Over an empty result set
    /// a row is added so the aggregate can be reported.
    pub fn apply_function(&mut self, function: Function, col: usize) -> Result<()> {
        let col_idx = self.column_index(col)?;
        let value = self.columns[col_idx].aggregate(function)?;

        if self.num_rows == 0 {
            self.add_row();
        }
        self.truncate_rows(1);

        let source = &self.columns[col_idx].meta;
        let meta = ColumnMeta {
            data_type: function.result_type(source.data_type),
            function: Some(function),
            ..source.clone()
        };
        let mut column = Column::with_nulls(meta, 1);
        column.set(0, value);
        self.columns[col_idx] = column;
        Ok(())
    }

    /// Writes the rendered table to `out`.
    pub fn print(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{self}")?;
        out.flush()
    }

    fn row_index(&self, row: usize) -> Result<usize> {
        if row == 0 || row > self.num_rows {
            return Err(Error::RowOutOfBounds {
                row,
                rows: self.num_rows,
            });
        }
        Ok(row - 1)
    }

    fn column_index(&self, col: usize) -> Result<usize> {
        if col == 0 || col > self.columns.len() {
            return Err(Error::ColumnOutOfBounds {
                column: col,
                columns: self.columns.len(),
            });
        }
        Ok(col - 1)
    }

    fn check_type(&self, col_idx: usize, actual: DataType) -> Result<()> {
        let expected = self.columns[col_idx].meta.data_type;
        if expected != actual {
            return Err(Error::TypeMismatch {
                column: col_idx + 1,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn get_typed(&self, row: usize, col: usize, expected: DataType) -> Result<Value> {
        let col_idx = self.column_index(col)?;
        let actual = self.columns[col_idx].meta.data_type;
        if actual != expected {
            return Err(Error::TypeMismatch {
                column: col,
                expected,
                actual,
            });
        }
        self.get(row, col)
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_rows == 0 {
            return writeln!(f, "**no data**");
        }

        let header: Vec<String> = self.columns().map(ColumnMeta::label).collect();
        writeln!(f, "{}", header.join(" | "))?;

        for row_idx in 0..self.num_rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|column| column.get(row_idx).unwrap_or(Value::Null).to_string())
                .collect();
            writeln!(f, "{}", cells.join(" | "))?;
        }

        match self.num_rows {
            1 => writeln!(f, "(1 row)"),
            n => writeln!(f, "({n} rows)"),
        }
    }
}
