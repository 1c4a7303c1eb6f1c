pub mod ast;
pub mod column;
pub mod data_type;
pub mod database;
pub mod error;
pub mod executor;
pub mod result_set;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use column::{ColumnMeta, Function};
pub use data_type::DataType;
pub use database::Database;
pub use error::{Error, Result};
pub use result_set::ResultSet;
pub use table::{ColumnDef, TableMeta};
pub use value::Value;
