//! Well-known sentinel MIME type names.
//!
//! These are the fixed names the resolver falls back to when no cache rule
//! applies. They are plain string constants, not enumerated values, so that
//! cache-derived names and sentinels flow through the same `&str` surface.

/// The unknown/fallback type for unclassifiable content.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The type reported for directories.
pub const INODE_DIRECTORY: &str = "inode/directory";

/// The type reported for otherwise-unclassified executable files.
pub const X_EXECUTABLE: &str = "application/x-executable";

/// The type reported for NUL-free (plain text) content.
pub const TEXT_PLAIN: &str = "text/plain";
