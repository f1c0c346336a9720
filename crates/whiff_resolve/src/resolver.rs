//! The classification entry points and fallback policy.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use memchr::memchr;
use tracing::debug;
use whiff_cache::{CacheFile, CacheRegistry};
use whiff_common::wellknown;

/// Floor for the content sniff buffer, so the plain-text heuristic has
/// bytes to look at even when no loaded cache carries magic rules.
const SNIFF_MIN: usize = 512;

/// Ceiling for the content sniff buffer. The extent comes from untrusted
/// cache files and must not be able to force arbitrarily large reads.
const SNIFF_MAX: usize = 256 * 1024;

/// The loaded MIME database: a cache registry plus the classification
/// policy layered on top of it.
///
/// Construct once with [`init`](Self::init) (or [`from_paths`](Self::from_paths)
/// in tests and tools), share by reference, and drop to release everything.
/// Lookups take `&self`; [`refresh`](Self::refresh) takes `&mut self`, so
/// reloading cannot race in-flight lookups.
#[derive(Debug)]
pub struct MimeDb {
    registry: CacheRegistry,
}

impl MimeDb {
    /// Discovers and loads one cache per configured MIME data directory
    /// (user directory first, then the system directories). Never fails;
    /// unusable caches behave as empty.
    pub fn init() -> Self {
        Self {
            registry: CacheRegistry::from_env(),
        }
    }

    /// Loads caches from explicit file paths, first = highest priority.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            registry: CacheRegistry::from_paths(paths),
        }
    }

    /// The underlying registry, for callers needing raw table lookups.
    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    /// Read-only view of the loaded cache files, for diagnostic reporting.
    pub fn caches(&self) -> &[CacheFile] {
        self.registry.caches()
    }

    /// Reloads every cache file in place (after `update-mime-database`
    /// has rewritten them, for example).
    pub fn refresh(&mut self) {
        self.registry.reload_all();
    }

    /// Resolves a mimetype name to its canonical name, or returns the name
    /// unchanged when no cache declares an alias for it.
    pub fn canonical<'a>(&'a self, mime_type: &'a str) -> &'a str {
        self.registry.lookup_alias(mime_type).unwrap_or(mime_type)
    }

    /// Classifies by filename alone: literal, then suffix, then glob.
    ///
    /// `is_directory` short-circuits to the directory type; callers that
    /// already hold directory-entry metadata use this to skip the stat.
    pub fn by_filename(&self, filename: &str, is_directory: bool) -> &str {
        if is_directory {
            return wellknown::INODE_DIRECTORY;
        }
        self.filename_match(filename)
            .unwrap_or(wellknown::OCTET_STREAM)
    }

    /// Classifies a filesystem entry by name and, when the name is
    /// inconclusive, by content.
    ///
    /// The decision ladder:
    ///
    /// 1. directories (by filesystem status, never overridable by caches);
    /// 2. literal / suffix / glob on the filename;
    /// 3. zero-length regular files are plain text;
    /// 4. magic rules over the leading bytes;
    /// 5. the executable sentinel for files with an execute bit;
    /// 6. plain text if the leading bytes contain no NUL;
    /// 7. the unknown sentinel.
    ///
    /// Symlinks are followed, so a link classifies as its target; a broken
    /// link falls through to filename classification and the unknown
    /// sentinel. Never fails.
    pub fn classify(&self, path: &Path) -> &str {
        let metadata = fs::metadata(path);
        if let Ok(meta) = &metadata {
            if meta.is_dir() {
                return wellknown::INODE_DIRECTORY;
            }
        }

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if let Some(mime) = self.filename_match(filename) {
            return mime;
        }

        let Ok(meta) = metadata else {
            return wellknown::OCTET_STREAM;
        };
        if !meta.is_file() {
            return wellknown::OCTET_STREAM;
        }
        if meta.len() == 0 {
            return wellknown::TEXT_PLAIN;
        }

        let head = match read_head(path, self.sniff_len()) {
            Ok(head) => head,
            Err(err) => {
                debug!(path = %path.display(), %err, "content sniff failed");
                Vec::new()
            }
        };
        if !head.is_empty() {
            if let Some(mime) = self.registry.lookup_magic(&head) {
                return mime;
            }
        }
        if mode_is_executable(&meta) {
            return wellknown::X_EXECUTABLE;
        }
        if !head.is_empty() && memchr(0, &head).is_none() {
            return wellknown::TEXT_PLAIN;
        }
        wellknown::OCTET_STREAM
    }

    /// Filename classification: literal first, then suffix, then glob.
    fn filename_match(&self, filename: &str) -> Option<&str> {
        if filename.is_empty() {
            return None;
        }
        self.registry
            .lookup_literal(filename)
            .or_else(|| self.registry.lookup_suffix(filename))
            .or_else(|| self.registry.lookup_glob(filename))
    }

    /// How many leading bytes to sniff: the registry's magic extent,
    /// clamped to a sane window.
    fn sniff_len(&self) -> usize {
        (self.registry.max_magic_extent() as usize).clamp(SNIFF_MIN, SNIFF_MAX)
    }
}

/// Reads up to `limit` leading bytes of the file.
fn read_head(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let mut head = Vec::with_capacity(limit.min(8192));
    file.take(limit as u64).read_to_end(&mut head)?;
    Ok(head)
}

#[cfg(unix)]
fn mode_is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn mode_is_executable(_meta: &fs::Metadata) -> bool {
    false
}
