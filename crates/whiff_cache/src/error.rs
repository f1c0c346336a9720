//! Error types for cache file parsing.

use std::path::PathBuf;

/// Errors produced while parsing a `mime.cache` file.
///
/// These surface only through [`CacheFile::parse`](crate::CacheFile::parse);
/// the fail-safe [`CacheFile::load`](crate::CacheFile::load) entry point
/// converts every variant into an always-empty cache after logging.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache file could not be opened or read.
    #[error("cannot read mime cache {path}: {source}")]
    Io {
        /// The cache file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache file declares a format version this reader does not support.
    #[error("unsupported mime cache version {major}.{minor} in {path} (supported: 1.2)")]
    UnsupportedVersion {
        /// The cache file path.
        path: PathBuf,
        /// Major version found in the header.
        major: u16,
        /// Minor version found in the header.
        minor: u16,
    },

    /// The file is too short to hold the header or a table descriptor.
    #[error("truncated mime cache {path}: header read at offset {offset} out of range")]
    Truncated {
        /// The cache file path.
        path: PathBuf,
        /// The offset of the failed header read.
        offset: u32,
    },
}
