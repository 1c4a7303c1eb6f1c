use std::{
    io::{self, BufRead},
    path::PathBuf,
    process,
};

use clap::Parser;
use flatquery::{Database, Error, ast::Select, executor};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Execute SELECT queries against a database of flat data files
#[derive(Parser, Debug)]
#[command(name = "flatquery")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database directory; table T is read from <DATABASE>/T.data
    #[arg(long)]
    database: PathBuf,

    /// Table metadata (defaults to <DATABASE>/catalog.json)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Single query descriptor to execute; without it, one JSON query per line is read from stdin
    #[arg(long)]
    query: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("**ERROR: {e}");
        process::exit(1);
    }
}

/// Executes the requested queries; only fatal errors are returned.
fn run(cli: &Cli) -> Result<(), Error> {
    let db = Database::open(&cli.database, cli.catalog.as_deref())?;
    info!(database = db.name(), tables = db.tables().len(), "database opened");

    if let Some(path) = &cli.query {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Input(format!("cannot read query {path:?}: {e}")))?;
        let select = decode(&content)?;
        return executor::execute_query(&db, &select, &mut io::stdout().lock());
    }

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| Error::Input(format!("cannot read stdin: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }

        let result = decode(&line)
            .and_then(|select| executor::execute_query(&db, &select, &mut io::stdout().lock()));
        match result {
            Err(e) if e.is_fatal() => {
                error!(error = %e, "execution halted");
                return Err(e);
            }
            Err(e) => warn!(error = %e, "query skipped"),
            Ok(()) => {}
        }
    }
    Ok(())
}

fn decode(json: &str) -> Result<Select, Error> {
    serde_json::from_str(json).map_err(|e| Error::Input(format!("invalid query: {e}")))
}
