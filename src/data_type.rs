use std::fmt;

use serde::Deserialize;

/// Declared type of a table column.
/// Every cell stored under a column is either of this type or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// A 64-bit signed integer.
    Int,
    /// A 64-bit floating-point number.
    Real,
    /// A UTF-8 character string.
    #[serde(alias = "string")]
    Text,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Real)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Real => write!(f, "real"),
            Self::Text => write!(f, "string"),
        }
    }
}
