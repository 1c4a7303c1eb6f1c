use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
};

use tracing::{debug, instrument};

use crate::{
    ast::{Predicate, Select},
    column::ColumnMeta,
    database::Database,
    error::{Error, Result},
    result_set::ResultSet,
    table::TableMeta,
    tokenizer::RecordTokenizer,
};

/// Executes `select` and writes the rendered result to `out`.
///
/// The result set only lives for the duration of this call.
///
/// # Example
/// ```no_run
/// use flatquery::{Database, ast::{Select, SelectColumn}, executor};
///
/// let db = Database::open("MovieLens", None).unwrap();
/// let select = Select::new("movies", vec![SelectColumn::new("movies", "title")]).with_limit(5);
/// executor::execute_query(&db, &select, &mut std::io::stdout()).unwrap();
/// ```
pub fn execute_query(db: &Database, select: &Select, out: &mut impl Write) -> Result<()> {
    let rs = execute(db, select)?;
    rs.print(out).map_err(Error::Output)
}

/// Runs every stage of the pipeline and returns the final result set.
///
/// Stages run in a fixed order: scan, filter, drop unrequested columns,
/// reorder, aggregate, limit.
#[instrument(name = "execute", skip_all, fields(db = %db.name(), table = %select.table))]
pub fn execute(db: &Database, select: &Select) -> Result<ResultSet> {
    let table = resolve_table(db, select)?;

    let mut rs = seed_columns(table)?;
    let scanned = scan(db, table, &mut rs)?;
    debug!(rows = scanned, "table scanned");

    if let Some(predicate) = &select.where_clause {
        let removed = filter(&mut rs, table, predicate)?;
        debug!(removed, remaining = rs.num_rows(), "where clause applied");
    }

    let dropped = drop_unrequested_columns(&mut rs, table, select)?;
    debug!(dropped, "unrequested columns dropped");

    reorder_columns(&mut rs, table, select)?;
    apply_aggregates(&mut rs, select)?;

    if let Some(limit) = select.limit {
        let before = rs.num_rows();
        rs.truncate_rows(limit);
        debug!(limit, truncated = before - rs.num_rows(), "limit applied");
    }

    Ok(rs)
}

/// Finds the metadata of the queried table.
pub fn resolve_table<'a>(db: &'a Database, select: &Select) -> Result<&'a TableMeta> {
    db.get_table(&select.table)
        .ok_or_else(|| Error::TableNotFound(select.table.clone()))
}

/// One un-aggregated column per table column, in definition order.
pub fn seed_columns(table: &TableMeta) -> Result<ResultSet> {
    let mut rs = ResultSet::new();
    for (idx, column) in table.columns.iter().enumerate() {
        rs.insert_column(
            idx + 1,
            ColumnMeta::new(&table.name, &column.name, column.data_type),
        )?;
    }
    Ok(rs)
}

/// Reads the table's data file, adding one row per record.
///
/// `rs` must hold the columns produced by [seed_columns]. Blank lines are
/// skipped. Returns the number of rows added.
pub fn scan(db: &Database, table: &TableMeta, rs: &mut ResultSet) -> Result<usize> {
    let path = db.data_path(table);
    let file = File::open(&path).map_err(|source| Error::DataFile {
        path: path.clone(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let types = table.column_types();
    // record plus terminator
    let mut line = String::with_capacity(table.record_size + 3);
    let mut rows = 0;

    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        if read == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let row = rs.add_row();
        for (idx, value) in RecordTokenizer::parse_record(&line, &types)
            .into_iter()
            .enumerate()
        {
            rs.put(row, idx + 1, value)?;
        }
        rows += 1;
    }
    Ok(rows)
}

/// Removes every row for which the predicate does not hold.
///
/// Rows are visited from last to first so that deleting a row never shifts
/// a row that is still to be visited. Empty cells never satisfy the
/// predicate. Returns the number of rows removed.
pub fn filter(rs: &mut ResultSet, table: &TableMeta, predicate: &Predicate) -> Result<usize> {
    let col = rs
        .find_column(1, &table.name, &predicate.column.name)
        .ok_or_else(|| Error::ColumnNotFound {
            table: table.name.clone(),
            column: predicate.column.name.clone(),
        })?;
    let literal = predicate.literal(rs.column(col)?.data_type);

    let mut removed = 0;
    for row in (1..=rs.num_rows()).rev() {
        let keep = rs
            .get(row, col)?
            .compare(&literal)
            .is_some_and(|ordering| predicate.op.holds(ordering));
        if !keep {
            rs.delete_row(row)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Deletes every table column that no requested column refers to.
/// Returns the number of columns deleted.
pub fn drop_unrequested_columns(
    rs: &mut ResultSet,
    table: &TableMeta,
    select: &Select,
) -> Result<usize> {
    let mut dropped = 0;
    for column in &table.columns {
        let requested = select
            .columns
            .iter()
            .any(|requested| requested.name.eq_ignore_ascii_case(&column.name));
        if requested {
            continue;
        }
        if let Some(col) = rs.find_column(1, &table.name, &column.name) {
            rs.delete_column(col)?;
            dropped += 1;
        }
    }
    Ok(dropped)
}

/// Moves the requested columns so that their order matches the query.
///
/// Positions before the current output slot are already final, so each
/// column is searched from its own slot onward.
pub fn reorder_columns(rs: &mut ResultSet, table: &TableMeta, select: &Select) -> Result<()> {
    for (idx, requested) in select.columns.iter().enumerate() {
        let slot = idx + 1;
        let from = rs
            .find_column(slot, &table.name, &requested.name)
            .ok_or_else(|| Error::ColumnNotFound {
                table: table.name.clone(),
                column: requested.name.clone(),
            })?;
        rs.move_column(from, slot)?;
    }
    Ok(())
}

/// Applies each requested aggregate to its column's final position.
pub fn apply_aggregates(rs: &mut ResultSet, select: &Select) -> Result<()> {
    for (idx, requested) in select.columns.iter().enumerate() {
        if let Some(function) = requested.function {
            rs.apply_function(function, idx + 1)?;
            debug!(%function, column = %requested.name, "aggregate applied");
        }
    }
    Ok(())
}
