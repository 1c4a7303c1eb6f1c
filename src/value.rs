use std::{cmp::Ordering, fmt, sync::Arc};

use crate::data_type::DataType;

/// A single cell of a result set.
///
/// Text cells hold their own immutable buffer; cloning a cell never exposes
/// storage owned by another structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An empty cell (missing field or empty aggregate).
    Null,
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating-point value.
    Real(f64),
    /// A UTF-8 string value.
    Text(Arc<str>),
}

impl Value {
    /// Returns `true` if the value is [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the inner integer value if this is a [Value::Int].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the inner float value if this is a [Value::Real].
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a reference to the inner string slice if this is a [Value::Text].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the [DataType] of this value, `None` for an empty cell.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int(_) => Some(DataType::Int),
            Self::Real(_) => Some(DataType::Real),
            Self::Text(_) => Some(DataType::Text),
        }
    }

    /// Three-way comparison between two non-empty values of the same type.
    ///
    /// Integers and reals compare numerically (`-0.0` equals `0.0`), strings
    /// byte-wise (like `strcmp`). Returns `None` when either side is empty,
    /// the types differ or a real is NaN.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Some(l.cmp(r)),
            (Self::Real(l), Self::Real(r)) => l.partial_cmp(r),
            (Self::Text(l), Self::Text(r)) => Some(l.as_bytes().cmp(r.as_bytes())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r:.2}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}
