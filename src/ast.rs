use std::cmp::Ordering;

use serde::Deserialize;

use crate::{column::Function, data_type::DataType, tokenizer, value::Value};

/// A validated `SELECT` query over a single table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Select {
    pub table: String,
    /// Requested output columns, in output order.
    pub columns: Vec<SelectColumn>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<Predicate>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Select {
    pub fn new(table: impl Into<String>, columns: Vec<SelectColumn>) -> Self {
        Self {
            table: table.into(),
            columns,
            where_clause: None,
            limit: None,
        }
    }

    pub fn with_where(mut self, predicate: Predicate) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One requested output column, optionally wrapped in an aggregate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectColumn {
    pub table: String,
    pub name: String,
    #[serde(default)]
    pub function: Option<Function>,
}

impl SelectColumn {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            function: None,
        }
    }

    pub fn with_function(mut self, function: Function) -> Self {
        self.function = Some(function);
        self
    }
}

/// Reference to a table column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "lt", alias = "<")]
    Lt,
    #[serde(rename = "lte", alias = "<=")]
    Lte,
    #[serde(rename = "gt", alias = ">")]
    Gt,
    #[serde(rename = "gte", alias = ">=")]
    Gte,
    #[serde(rename = "eq", alias = "=")]
    Eq,
    #[serde(rename = "ne", alias = "<>", alias = "!=")]
    NotEq,
}

impl ComparisonOp {
    /// Whether `column <op> literal` holds, given the ordering of the column
    /// value relative to the literal.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => ordering.is_lt(),
            Self::Lte => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Gte => ordering.is_ge(),
            Self::Eq => ordering.is_eq(),
            Self::NotEq => ordering.is_ne(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralType {
    Int,
    Real,
    String,
}

/// `WHERE column <op> literal`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Predicate {
    pub column: ColumnRef,
    pub op: ComparisonOp,
    /// Literal as written in the query, without quotes.
    pub value: String,
    /// Type the analyzer gave the literal. Informational only: the literal is
    /// converted with the declared type of the column, see [Predicate::literal].
    #[serde(rename = "type")]
    pub literal_type: LiteralType,
}

impl Predicate {
    pub fn new(
        column: ColumnRef,
        op: ComparisonOp,
        value: impl Into<String>,
        literal_type: LiteralType,
    ) -> Self {
        Self {
            column,
            op,
            value: value.into(),
            literal_type,
        }
    }

    /// The literal converted to the declared type of the column it is
    /// compared with, using the same lenient conversions as data files.
    pub fn literal(&self, data_type: DataType) -> Value {
        match data_type {
            DataType::Int => Value::Int(tokenizer::parse_int(&self.value)),
            DataType::Real => Value::Real(tokenizer::parse_real(&self.value)),
            DataType::Text => Value::Text(self.value.as_str().into()),
        }
    }
}
