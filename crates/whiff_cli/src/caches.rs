//! `whiff caches` — report the loaded cache files.

use serde::Serialize;
use whiff_cache::CacheStats;
use whiff_resolve::MimeDb;

use crate::{CachesArgs, ReportFormat};

/// One loaded cache file and its table counts.
#[derive(Debug, Serialize)]
pub struct CacheReport {
    /// The cache file path.
    pub path: String,
    /// Whether the cache loaded empty (missing, unreadable, or
    /// unsupported version).
    pub empty: bool,
    /// Per-table entry counts.
    pub stats: CacheStats,
}

/// Runs the `whiff caches` command.
pub fn run(args: &CachesArgs, db: &MimeDb) -> Result<i32, Box<dyn std::error::Error>> {
    let reports = collect(db);

    match args.format {
        ReportFormat::Text => {
            for report in &reports {
                if report.empty {
                    println!("{}: empty", report.path);
                    continue;
                }
                let s = &report.stats;
                println!(
                    "{}: {} literals, {} globs, {} suffix roots, {} magic entries (extent {}), {} aliases, {} parents",
                    report.path,
                    s.literals,
                    s.globs,
                    s.suffix_roots,
                    s.magic_entries,
                    s.magic_max_extent,
                    s.aliases,
                    s.parents,
                );
            }
            println!(
                "max magic extent: {}",
                db.registry().max_magic_extent()
            );
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }
    Ok(0)
}

/// Builds one report per loaded cache, in priority order.
fn collect(db: &MimeDb) -> Vec<CacheReport> {
    db.caches()
        .iter()
        .map(|cache| CacheReport {
            path: cache.path().display().to_string(),
            empty: cache.is_empty(),
            stats: cache.stats(),
        })
        .collect()
}
