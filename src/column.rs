use std::{fmt, sync::Arc};

use bitvec::prelude::*;
use serde::Deserialize;

use crate::{
    data_type::DataType,
    error::{Error, Result},
    value::Value,
};

/// Aggregate function that can be applied to a result set column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl Function {
    /// Type of the aggregate's result over a column of type `input`.
    pub fn result_type(self, input: DataType) -> DataType {
        match self {
            Self::Count => DataType::Int,
            Self::Avg => DataType::Real,
            Self::Min | Self::Max | Self::Sum => input,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
        };
        f.write_str(name)
    }
}

/// Descriptor of one result set column.
/// Its 1-based position is implied by its index in the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    /// Table the column originates from.
    pub table: String,
    /// Column name within that table.
    pub name: String,
    /// Declared type; every non-empty cell of the column has this type.
    pub data_type: DataType,
    /// Aggregate applied to the column, if any.
    pub function: Option<Function>,
}

impl ColumnMeta {
    pub fn new(table: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            data_type,
            function: None,
        }
    }

    /// Case-insensitive match on the (table, column) pair.
    pub fn matches(&self, table: &str, name: &str) -> bool {
        self.table.eq_ignore_ascii_case(table) && self.name.eq_ignore_ascii_case(name)
    }

    /// Header label, e.g. `movies.title` or `MAX(movies.year)`.
    pub fn label(&self) -> String {
        match self.function {
            Some(function) => format!("{function}({}.{})", self.table, self.name),
            None => format!("{}.{}", self.table, self.name),
        }
    }
}

/// Physical storage for column data.
/// Each variant wraps a collection of a specific type to ensure contiguous memory
/// allocation (columnar storage).
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// Vector of 64-bit integers.
    Int(Vec<i64>),
    /// Vector of 64-bit floats.
    Real(Vec<f64>),
    /// Vector of reference-counted immutable strings.
    Text(Vec<Arc<str>>),
}

/// One column of a result set: descriptor, values and a nullability tracker.
#[derive(Debug, Clone)]
pub struct Column {
    pub meta: ColumnMeta,
    data: ColumnData,
    /// A bitmap where a `true` bit indicates that the cell at that index is empty.
    null_bitmap: BitVec,
}

impl Column {
    /// Creates a column of `len` empty cells.
    pub fn with_nulls(meta: ColumnMeta, len: usize) -> Self {
        let data = match meta.data_type {
            DataType::Int => ColumnData::Int(vec![0; len]),
            DataType::Real => ColumnData::Real(vec![0.0; len]),
            DataType::Text => ColumnData::Text(vec![Arc::from(""); len]),
        };
        Self {
            meta,
            data,
            null_bitmap: BitVec::repeat(true, len),
        }
    }

    /// Appends an empty cell.
    pub fn push_null(&mut self) {
        self.null_bitmap.push(true);
        // Add default value to keep alignment between the data vector and the bitmap
        match &mut self.data {
            ColumnData::Int(v) => v.push(0),
            ColumnData::Real(v) => v.push(0.0),
            ColumnData::Text(v) => v.push(Arc::from("")),
        }
    }

    /// Returns the number of cells in the column.
    pub fn len(&self) -> usize {
        self.null_bitmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cell at `row_idx`, or `None` if it is out of bounds.
    pub fn get(&self, row_idx: usize) -> Option<Value> {
        if row_idx >= self.len() {
            return None;
        }
        if self.null_bitmap[row_idx] {
            return Some(Value::Null);
        }
        match &self.data {
            ColumnData::Int(col) => Some(Value::Int(col[row_idx])),
            ColumnData::Real(col) => Some(Value::Real(col[row_idx])),
            ColumnData::Text(col) => Some(Value::Text(Arc::clone(&col[row_idx]))),
        }
    }

    /// Overwrites the cell at `row_idx`.
    ///
    /// Returns `false`, leaving the column untouched, if the index is out of
    /// bounds or the value's type differs from the column's declared type.
    /// Writing [Value::Null] only flips the null bit.
    pub fn set(&mut self, row_idx: usize, value: Value) -> bool {
        if row_idx >= self.len() {
            return false;
        }
        match (&mut self.data, value) {
            (_, Value::Null) => {
                self.null_bitmap.set(row_idx, true);
                return true;
            }
            (ColumnData::Int(col), Value::Int(v)) => col[row_idx] = v,
            (ColumnData::Real(col), Value::Real(v)) => col[row_idx] = v,
            (ColumnData::Text(col), Value::Text(v)) => col[row_idx] = v,
            _ => return false,
        }
        self.null_bitmap.set(row_idx, false);
        true
    }

    /// Removes the cell at `row_idx`, shifting the following cells down.
    pub fn remove(&mut self, row_idx: usize) -> bool {
        if row_idx >= self.len() {
            return false;
        }
        match &mut self.data {
            ColumnData::Int(col) => {
                col.remove(row_idx);
            }
            ColumnData::Real(col) => {
                col.remove(row_idx);
            }
            ColumnData::Text(col) => {
                col.remove(row_idx);
            }
        }
        self.null_bitmap.remove(row_idx);
        true
    }

    /// Keeps the first `len` cells.
    pub fn truncate(&mut self, len: usize) {
        match &mut self.data {
            ColumnData::Int(col) => col.truncate(len),
            ColumnData::Real(col) => col.truncate(len),
            ColumnData::Text(col) => col.truncate(len),
        }
        self.null_bitmap.truncate(len);
    }

    /// Computes `function` over the column.
    ///
    /// `count` counts every row. The other aggregates skip empty cells; over
    /// no values `sum` is zero and `min`, `max` and `avg` are empty.
    ///
    /// # Errors
    /// Returns [Error::InvalidAggregate] for `sum` or `avg` over a text column.
    pub fn aggregate(&self, function: Function) -> Result<Value> {
        let value = match (&self.data, function) {
            (_, Function::Count) => Value::Int(self.len() as i64),
            (ColumnData::Int(col), Function::Sum) => {
                Value::Int(self.present(col).fold(0i64, |acc, v| acc.saturating_add(*v)))
            }
            (ColumnData::Int(col), Function::Avg) => {
                average(self.present(col).map(|v| *v as f64))
            }
            (ColumnData::Int(col), Function::Min) => {
                self.present(col).min().map_or(Value::Null, |v| Value::Int(*v))
            }
            (ColumnData::Int(col), Function::Max) => {
                self.present(col).max().map_or(Value::Null, |v| Value::Int(*v))
            }
            (ColumnData::Real(col), Function::Sum) => Value::Real(self.present(col).sum()),
            (ColumnData::Real(col), Function::Avg) => average(self.present(col).copied()),
            (ColumnData::Real(col), Function::Min) => self
                .present(col)
                .min_by(|a, b| a.total_cmp(b))
                .map_or(Value::Null, |v| Value::Real(*v)),
            (ColumnData::Real(col), Function::Max) => self
                .present(col)
                .max_by(|a, b| a.total_cmp(b))
                .map_or(Value::Null, |v| Value::Real(*v)),
            (ColumnData::Text(col), Function::Min) => self
                .present(col)
                .min()
                .map_or(Value::Null, |v| Value::Text(Arc::clone(v))),
            (ColumnData::Text(col), Function::Max) => self
                .present(col)
                .max()
                .map_or(Value::Null, |v| Value::Text(Arc::clone(v))),
            (ColumnData::Text(_), Function::Sum | Function::Avg) => {
                return Err(Error::InvalidAggregate {
                    function,
                    data_type: self.meta.data_type,
                });
            }
        };
        Ok(value)
    }

    /// Iterates over the non-empty cells of `data`.
    fn present<'a, T>(&'a self, data: &'a [T]) -> impl Iterator<Item = &'a T> + 'a {
        self.null_bitmap.iter_zeros().map(move |idx| &data[idx])
    }
}

fn average(values: impl Iterator<Item = f64>) -> Value {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        Value::Null
    } else {
        Value::Real(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_column(values: &[Value]) -> Column {
        let mut col = Column::with_nulls(ColumnMeta::new("t", "n", DataType::Int), values.len());
        for (i, v) in values.iter().enumerate() {
            assert!(col.set(i, v.clone()));
        }
        col
    }

    #[test]
    fn test_with_nulls() {
        let col = Column::with_nulls(ColumnMeta::new("movies", "title", DataType::Text), 3);

        assert_eq!(col.len(), 3);
        assert!(!col.is_empty());
        for i in 0..3 {
            assert_eq!(col.get(i), Some(Value::Null));
        }
        assert_eq!(col.get(3), None);
    }

    #[test]
    fn test_push_null_and_set() {
        let mut col = Column::with_nulls(ColumnMeta::new("t", "age", DataType::Int), 0);
        assert!(col.is_empty());

        col.push_null();
        col.push_null();
        assert!(col.set(0, Value::Int(31)));
        assert_eq!(col.get(0), Some(Value::Int(31)));
        assert_eq!(col.get(1), Some(Value::Null));

        assert!(col.set(0, Value::Null));
        assert_eq!(col.get(0), Some(Value::Null));

        assert!(!col.set(0, Value::Text("hello".into())));
        assert!(!col.set(10, Value::Int(42)));
    }

    #[test]
    fn test_remove_and_truncate() {
        let mut col = int_column(&[Value::Int(42), Value::Int(59), Value::Null, Value::Int(7)]);

        assert!(col.remove(1));
        assert_eq!(col.len(), 3);
        assert_eq!(col.get(0), Some(Value::Int(42)));
        assert_eq!(col.get(1), Some(Value::Null));
        assert_eq!(col.get(2), Some(Value::Int(7)));
        assert!(!col.remove(3));

        col.truncate(1);
        assert_eq!(col.len(), 1);
        assert_eq!(col.get(1), None);
    }

    #[test]
    fn test_aggregate_int() {
        let col = int_column(&[Value::Int(3), Value::Null, Value::Int(9), Value::Int(-1)]);

        assert_eq!(col.aggregate(Function::Count).unwrap(), Value::Int(4));
        assert_eq!(col.aggregate(Function::Sum).unwrap(), Value::Int(11));
        assert_eq!(col.aggregate(Function::Min).unwrap(), Value::Int(-1));
        assert_eq!(col.aggregate(Function::Max).unwrap(), Value::Int(9));
        assert_eq!(col.aggregate(Function::Avg).unwrap(), Value::Real(11.0 / 3.0));
    }

    #[test]
    fn test_aggregate_real_and_text() {
        let mut real = Column::with_nulls(ColumnMeta::new("t", "r", DataType::Real), 2);
        real.set(0, Value::Real(1.5));
        real.set(1, Value::Real(2.5));
        assert_eq!(real.aggregate(Function::Sum).unwrap(), Value::Real(4.0));
        assert_eq!(real.aggregate(Function::Avg).unwrap(), Value::Real(2.0));
        assert_eq!(real.aggregate(Function::Max).unwrap(), Value::Real(2.5));

        let mut text = Column::with_nulls(ColumnMeta::new("t", "s", DataType::Text), 2);
        text.set(0, Value::Text("pear".into()));
        text.set(1, Value::Text("apple".into()));
        assert_eq!(text.aggregate(Function::Min).unwrap(), Value::Text("apple".into()));
        assert_eq!(text.aggregate(Function::Max).unwrap(), Value::Text("pear".into()));
        assert!(matches!(
            text.aggregate(Function::Sum),
            Err(Error::InvalidAggregate { .. })
        ));
    }

    #[test]
    fn test_aggregate_empty() {
        let col = Column::with_nulls(ColumnMeta::new("t", "n", DataType::Int), 0);

        assert_eq!(col.aggregate(Function::Count).unwrap(), Value::Int(0));
        assert_eq!(col.aggregate(Function::Sum).unwrap(), Value::Int(0));
        assert_eq!(col.aggregate(Function::Min).unwrap(), Value::Null);
        assert_eq!(col.aggregate(Function::Avg).unwrap(), Value::Null);
    }

    #[test]
    fn test_meta_label_and_matches() {
        let mut meta = ColumnMeta::new("Movies", "Year", DataType::Int);
        assert!(meta.matches("movies", "YEAR"));
        assert!(!meta.matches("movies", "id"));
        assert_eq!(meta.label(), "Movies.Year");

        meta.function = Some(Function::Max);
        assert_eq!(meta.label(), "MAX(Movies.Year)");
        assert_eq!(Function::Avg.result_type(DataType::Int), DataType::Real);
        assert_eq!(Function::Count.result_type(DataType::Text), DataType::Int);
    }
}
