//! `whiff info` — describe a mimetype's relations and kind flags.

use serde::Serialize;
use whiff_resolve::MimeDb;

use crate::{InfoArgs, ReportFormat};

/// Everything the engine knows about one mimetype name.
#[derive(Debug, Serialize)]
pub struct InfoReport {
    /// The queried name.
    pub mime_type: String,
    /// The canonical name (same as `mime_type` when no alias applies).
    pub canonical: String,
    /// Immediate parents declared by any loaded cache.
    pub parents: Vec<String>,
    /// Kind predicate results.
    pub kinds: KindFlags,
}

/// Boolean results of the kind predicates.
#[derive(Debug, Serialize)]
pub struct KindFlags {
    /// `text/*` or immediate subclass of `text/plain`.
    pub text: bool,
    /// The executable sentinel or an immediate subclass of it.
    pub executable: bool,
    /// Member of the fixed archive type table.
    pub archive: bool,
    /// `image/*`.
    pub image: bool,
    /// `video/*`.
    pub video: bool,
    /// The unknown sentinel.
    pub unknown: bool,
}

/// Runs the `whiff info` command.
pub fn run(args: &InfoArgs, db: &MimeDb) -> Result<i32, Box<dyn std::error::Error>> {
    let report = describe(db, &args.mime_type);

    match args.format {
        ReportFormat::Text => {
            println!("{}", report.mime_type);
            if report.canonical != report.mime_type {
                println!("  canonical: {}", report.canonical);
            }
            if !report.parents.is_empty() {
                println!("  parents: {}", report.parents.join(", "));
            }
            let flags = flag_names(&report.kinds);
            if !flags.is_empty() {
                println!("  kinds: {}", flags.join(", "));
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(0)
}

/// Collects relations and predicate results for one mimetype name.
fn describe(db: &MimeDb, mime_type: &str) -> InfoReport {
    InfoReport {
        mime_type: mime_type.to_string(),
        canonical: db.canonical(mime_type).to_string(),
        parents: db
            .registry()
            .lookup_parents(mime_type)
            .into_iter()
            .map(str::to_string)
            .collect(),
        kinds: KindFlags {
            text: db.is_text(mime_type),
            executable: db.is_executable(mime_type),
            archive: db.is_archive(mime_type),
            image: db.is_image(mime_type),
            video: db.is_video(mime_type),
            unknown: db.is_unknown(mime_type),
        },
    }
}

/// The names of the set flags, for the text report.
fn flag_names(kinds: &KindFlags) -> Vec<&'static str> {
    let mut names = Vec::new();
    if kinds.text {
        names.push("text");
    }
    if kinds.executable {
        names.push("executable");
    }
    if kinds.archive {
        names.push("archive");
    }
    if kinds.image {
        names.push("image");
    }
    if kinds.video {
        names.push("video");
    }
    if kinds.unknown {
        names.push("unknown");
    }
    names
}
