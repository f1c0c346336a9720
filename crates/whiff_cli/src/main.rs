//! whiff CLI — classify files and inspect the loaded MIME caches.
//!
//! Provides `whiff query` to classify paths by name and content,
//! `whiff info` to describe a mimetype's relations and kind flags, and
//! `whiff caches` to report the loaded cache files and their table counts.

#![warn(missing_docs)]

mod caches;
mod info;
mod query;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use whiff_cache::SearchPath;
use whiff_resolve::MimeDb;

/// whiff — MIME type classification from shared-mime-info caches.
#[derive(Parser, Debug)]
#[command(name = "whiff", version, about = "MIME type classification")]
pub struct Cli {
    /// Suppress all logging except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory to search for `mime/mime.cache` instead of the XDG
    /// defaults. Repeatable; the first directory has the highest priority.
    #[arg(long, global = true, value_name = "DIR")]
    pub mime_dir: Vec<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify one or more paths.
    Query(QueryArgs),
    /// Show canonical name, parents, and kind flags for a mimetype.
    Info(InfoArgs),
    /// List the loaded cache files and their table counts.
    Caches(CachesArgs),
}

/// Arguments for the `whiff query` subcommand.
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Paths to classify.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Classify by filename only, without reading file content.
    #[arg(long)]
    pub filename_only: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `whiff info` subcommand.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// The mimetype name to describe (e.g. `text/x-csrc`).
    pub mime_type: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `whiff caches` subcommand.
#[derive(Parser, Debug)]
pub struct CachesArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Output format for command reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text on stdout.
    Text,
    /// Pretty-printed JSON on stdout.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let db = if cli.mime_dir.is_empty() {
        MimeDb::init()
    } else {
        MimeDb::from_paths(SearchPath::from_dirs(cli.mime_dir.clone()).cache_files())
    };

    let result = match &cli.command {
        Command::Query(args) => query::run(args, &db),
        Command::Info(args) => info::run(args, &db),
        Command::Caches(args) => caches::run(args, &db),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    }
}

/// Installs the tracing subscriber: `RUST_LOG` wins when set, otherwise
/// the level follows the `--quiet`/`--verbose` flags.
fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
