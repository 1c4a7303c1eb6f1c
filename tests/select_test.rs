//! End-to-end SELECT execution over a database directory of flat data files.

use std::fs;

use flatquery::{
    Database, Function, Value,
    ast::{ColumnRef, ComparisonOp, LiteralType, Predicate, Select, SelectColumn},
    executor,
};
use tempfile::TempDir;

const CATALOG: &str = r#"{
    "tables": [
        {
            "name": "Movies",
            "record_size": 48,
            "columns": [
                {"name": "id", "type": "int"},
                {"name": "title", "type": "string"},
                {"name": "year", "type": "int"}
            ]
        }
    ]
}"#;

fn create_database(records: &[&str]) -> (TempDir, Database) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let root = dir.path().join("MovieLens");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("catalog.json"), CATALOG).unwrap();

    let mut data = String::new();
    for record in records {
        data.push_str(record);
        data.push('\n');
    }
    fs::write(root.join("Movies.data"), data).unwrap();

    let db = Database::open(&root, None).unwrap();
    (dir, db)
}

fn five_movies() -> (TempDir, Database) {
    create_database(&[
        "1 'Forest Gump' 1994",
        "2 \"Schindler's List\" 1993",
        "3 'Alien' 1979",
        "4 'The Matrix' 1999",
        "5 'Brazil' 1985",
    ])
}

fn column(name: &str) -> SelectColumn {
    SelectColumn::new("movies", name)
}

fn where_year(op: ComparisonOp, value: &str) -> Predicate {
    Predicate::new(
        ColumnRef {
            table: "movies".into(),
            name: "year".into(),
        },
        op,
        value,
        LiteralType::Int,
    )
}

fn render(db: &Database, select: &Select) -> String {
    let mut out = Vec::new();
    executor::execute_query(db, select, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_where_selects_single_title() {
    let (_dir, db) = create_database(&["1 'Forest Gump' 1994"]);
    let select =
        Select::new("movies", vec![column("title")]).with_where(where_year(ComparisonOp::Gt, "1990"));

    let rs = executor::execute(&db, &select).unwrap();
    assert_eq!(rs.num_rows(), 1);
    assert_eq!(rs.num_columns(), 1);
    assert_eq!(rs.row(1).unwrap(), vec![Value::Text("Forest Gump".into())]);

    assert_eq!(render(&db, &select), "Movies.title\nForest Gump\n(1 row)\n");
}

#[test]
fn test_requested_order_is_kept() {
    let (_dir, db) = five_movies();
    let select = Select::new("movies", vec![column("title"), column("id")]);

    let rs = executor::execute(&db, &select).unwrap();
    let names: Vec<&str> = rs.columns().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["title", "id"]);
    assert_eq!(
        rs.row(2).unwrap(),
        vec![Value::Text("Schindler's List".into()), Value::Int(2)]
    );
    assert_eq!(
        rs.row(5).unwrap(),
        vec![Value::Text("Brazil".into()), Value::Int(5)]
    );
}

#[test]
fn test_limit_keeps_first_rows() {
    let (_dir, db) = five_movies();
    let select = Select::new("movies", vec![column("id"), column("title")]).with_limit(2);

    assert_eq!(
        render(&db, &select),
        "Movies.id | Movies.title\n1 | Forest Gump\n2 | Schindler's List\n(2 rows)\n"
    );
}

#[test]
fn test_filter_then_limit() {
    let (_dir, db) = five_movies();
    let select = Select::new("movies", vec![column("title")])
        .with_where(where_year(ComparisonOp::Lte, "1993"))
        .with_limit(2);

    let rs = executor::execute(&db, &select).unwrap();
    let titles: Vec<String> = (1..=rs.num_rows())
        .map(|row| rs.get_string(row, 1).unwrap().unwrap())
        .collect();
    assert_eq!(titles, vec!["Schindler's List", "Alien"]);
}

#[test]
fn test_no_match_renders_no_data() {
    let (_dir, db) = five_movies();
    let select =
        Select::new("movies", vec![column("id")]).with_where(where_year(ComparisonOp::Eq, "2020"));

    assert_eq!(render(&db, &select), "**no data**\n");
}

#[test]
fn test_aggregates() {
    let (_dir, db) = five_movies();

    let select = Select::new("movies", vec![column("year").with_function(Function::Max)]);
    assert_eq!(render(&db, &select), "MAX(Movies.year)\n1999\n(1 row)\n");

    let select = Select::new("movies", vec![column("id").with_function(Function::Count)])
        .with_where(where_year(ComparisonOp::NotEq, "1979"));
    let rs = executor::execute(&db, &select).unwrap();
    assert_eq!(rs.get_int(1, 1).unwrap(), Some(4));

    let select = Select::new("movies", vec![column("title").with_function(Function::Min)]);
    let rs = executor::execute(&db, &select).unwrap();
    assert_eq!(rs.get_string(1, 1).unwrap().as_deref(), Some("Alien"));
}

#[test]
fn test_empty_table() {
    let (_dir, db) = create_database(&[]);
    let select = Select::new("movies", vec![column("id"), column("title")]);

    let rs = executor::execute(&db, &select).unwrap();
    assert_eq!(rs.num_rows(), 0);
    assert_eq!(rs.num_columns(), 2);
}

#[test]
fn test_missing_table_is_fatal() {
    let (_dir, db) = five_movies();
    let err = executor::execute(&db, &Select::new("reviews", vec![column("id")])).unwrap_err();

    assert!(matches!(err, flatquery::Error::TableNotFound(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_query_from_json() {
    let (_dir, db) = five_movies();
    let select: Select = serde_json::from_str(
        r#"{
            "table": "MOVIES",
            "columns": [{"table": "movies", "name": "year"}, {"table": "movies", "name": "title"}],
            "where": {"column": {"table": "movies", "name": "title"}, "op": "=", "value": "Alien", "type": "string"}
        }"#,
    )
    .unwrap();

    assert_eq!(render(&db, &select), "Movies.year | Movies.title\n1979 | Alien\n(1 row)\n");
}
