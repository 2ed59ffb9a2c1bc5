use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod db;
mod db_types;
mod error;
mod format;
mod parser;
mod predicate;
mod registry;
mod repl;
mod rows;
mod storage;

use crate::config::Config;
use crate::db::Database;
use crate::repl::Repl;
use crate::storage::JsonFileStore;

/// Command-driven record store persisted as JSON documents.
#[derive(Parser, Debug)]
#[command(name = "recstore", version, about)]
struct Args {
    /// Directory holding the per-table row documents
    #[arg(long, value_name = "DIR", env = "RECSTORE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path of the table registry document
    #[arg(long, value_name = "FILE", env = "RECSTORE_META_FILE")]
    meta_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Ask for confirmation before drop_table and delete
    #[arg(long)]
    confirm: bool,

    /// Report how long each command took
    #[arg(long)]
    timing: bool,

    /// Suppress the banner and help at startup
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    // Stdin is read on a blocking thread that cannot be cancelled, so do not
    // wait for the runtime to wind down.
    std::process::exit(code);
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let store = JsonFileStore::new(config.meta_file.clone(), config.data_dir.clone());
    store
        .ensure_data_dir()
        .context("failed to prepare data directory")?;

    let mut repl = Repl::new(Database::new(store), config);

    if let Some(line) = &args.command {
        return repl.run_command(line).await;
    }

    repl.run(args.quiet).await
}

fn init_logging(verbose: bool) {
    let default = if verbose { "recstore=debug" } else { "recstore=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default()?,
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(file) = &args.meta_file {
        config.meta_file = file.clone();
    }
    config.confirm_destructive |= args.confirm;
    config.timing |= args.timing;

    Ok(config)
}
