use std::{error::Error, fs, path::PathBuf, process::exit};

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fintrack_rs::{OwnerId, initialize_db, read_workbook, reconcile_spreadsheet};

/// Import the transactions in an `.xlsx` spreadsheet into a fintrack_rs database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The owner that the imported transactions and categories belong to.
    #[arg(long)]
    owner_id: String,

    /// The spreadsheet to import.
    spreadsheet: PathBuf,

    /// Log every step of the import.
    #[arg(short, long)]
    verbose: bool,
}

/// Import a spreadsheet and print what was stored as JSON.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        filter::LevelFilter::DEBUG
    } else {
        filter::LevelFilter::WARN
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(level),
        )
        .init();

    if args.spreadsheet.extension().is_none_or(|extension| !extension.eq_ignore_ascii_case("xlsx")) {
        eprintln!("The spreadsheet must be an .xlsx file.");
        exit(1);
    }

    let bytes = fs::read(&args.spreadsheet)?;
    let sheets = read_workbook(&bytes)?;

    let mut connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    let tx = connection.transaction()?;
    let result = reconcile_spreadsheet(&OwnerId::new(&args.owner_id), &sheets, &*tx)?;
    tx.commit()?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
