use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{Error, Result},
    table::TableMeta,
};

/// Name of the catalog file looked up inside a database directory.
pub const CATALOG_FILE: &str = "catalog.json";

/// Metadata of one database: its directory and the tables it contains.
///
/// The data of table `T` lives in `<root>/T.data`.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    root: PathBuf,
    tables: Vec<TableMeta>,
}

#[derive(Deserialize)]
struct Catalog {
    tables: Vec<TableMeta>,
}

impl Database {
    /// Creates a database rooted at `root`; its name is the directory name.
    pub fn new(root: impl Into<PathBuf>, tables: Vec<TableMeta>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, root, tables }
    }

    /// Loads the table metadata of the database at `root`.
    ///
    /// The catalog is read from `catalog`, or from `<root>/catalog.json` when
    /// no path is given.
    ///
    /// # Errors
    /// Returns [Error::Input] if the catalog cannot be read or decoded.
    pub fn open(root: impl Into<PathBuf>, catalog: Option<&Path>) -> Result<Self> {
        let root = root.into();
        let catalog_path = catalog.map_or_else(|| root.join(CATALOG_FILE), Path::to_path_buf);

        let content = fs::read_to_string(&catalog_path)
            .map_err(|e| Error::Input(format!("cannot read {catalog_path:?}: {e}")))?;
        let catalog: Catalog = serde_json::from_str(&content)
            .map_err(|e| Error::Input(format!("invalid catalog {catalog_path:?}: {e}")))?;

        debug!(path = ?catalog_path, tables = catalog.tables.len(), "catalog loaded");
        Ok(Self::new(root, catalog.tables))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns a list of all tables of the database.
    pub fn tables(&self) -> &[TableMeta] {
        &self.tables
    }

    /// Case-insensitive table lookup.
    pub fn get_table(&self, name: &str) -> Option<&TableMeta> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    /// Path of the data file holding the records of `table`.
    pub fn data_path(&self, table: &TableMeta) -> PathBuf {
        self.root.join(format!("{}.data", table.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data_type::DataType, table::ColumnDef};
    use tempfile::TempDir;

    fn movies() -> TableMeta {
        TableMeta::new("Movies", 32, vec![ColumnDef::new("id", DataType::Int)])
    }

    #[test]
    fn test_name_and_data_path() {
        let db = Database::new("dbs/MovieLens", vec![movies()]);

        assert_eq!(db.name(), "MovieLens");
        assert_eq!(
            db.data_path(&movies()),
            PathBuf::from("dbs/MovieLens/Movies.data")
        );
    }

    #[test]
    fn test_get_table_case_insensitive() {
        let db = Database::new("MovieLens", vec![movies()]);

        assert_eq!(db.get_table("movies").unwrap().name, "Movies");
        assert_eq!(db.get_table("MOVIES").unwrap().name, "Movies");
        assert!(db.get_table("reviews").is_none());
        assert_eq!(db.tables().len(), 1);
    }

    #[test]
    fn test_open_catalog() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CATALOG_FILE),
            r#"{"tables": [{"name": "Movies", "columns": [{"name": "id", "type": "int"}]}]}"#,
        )
        .unwrap();

        let db = Database::open(dir.path(), None).unwrap();
        assert_eq!(db.root(), dir.path());
        assert_eq!(db.get_table("movies").unwrap().record_size, 0);
    }

    #[test]
    fn test_open_missing_or_invalid_catalog() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Database::open(dir.path(), None),
            Err(Error::Input(_))
        ));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Database::open(dir.path(), Some(&path)),
            Err(Error::Input(_))
        ));
    }
}
