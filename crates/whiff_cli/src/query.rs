//! `whiff query` — classify paths.

use std::path::Path;

use serde::Serialize;
use whiff_resolve::MimeDb;

use crate::{QueryArgs, ReportFormat};

/// One classified path.
#[derive(Debug, Serialize)]
pub struct QueryReport {
    /// The path as given on the command line.
    pub path: String,
    /// The resolved mimetype name.
    pub mime_type: String,
}

/// Runs the `whiff query` command. Always exits 0: classification never
/// fails, it only ever falls back to a sentinel type.
pub fn run(args: &QueryArgs, db: &MimeDb) -> Result<i32, Box<dyn std::error::Error>> {
    let reports: Vec<QueryReport> = args
        .paths
        .iter()
        .map(|path| classify_path(db, path, args.filename_only))
        .collect();

    match args.format {
        ReportFormat::Text => {
            for report in &reports {
                println!("{}: {}", report.path, report.mime_type);
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }
    Ok(0)
}

/// Classifies a single path, by content or filename only.
fn classify_path(db: &MimeDb, path: &Path, filename_only: bool) -> QueryReport {
    let mime_type = if filename_only {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        db.by_filename(name, path.is_dir())
    } else {
        db.classify(path)
    };
    QueryReport {
        path: path.display().to_string(),
        mime_type: mime_type.to_string(),
    }
}
