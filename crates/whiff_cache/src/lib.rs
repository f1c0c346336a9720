//! Reader for the shared-mime-info binary `mime.cache` format.
//!
//! This crate parses version 1.2 cache files into table descriptors and
//! exposes the five lookup operations defined by the format: literal
//! filename match, reverse-suffix-tree match, shell-glob match, content
//! "magic" match, and parent/alias relations. [`CacheRegistry`] combines
//! several cache files (user cache first, then system caches) with the
//! cross-file priority and tie-break rules the format prescribes.
//!
//! All reads are fail-safe: a missing, unreadable, or wrong-version cache
//! file behaves as an empty cache, and a malformed offset inside an
//! otherwise valid file fails only the lookup that touched it.

#![warn(missing_docs)]

pub mod error;
pub mod file;
pub mod glob;
pub mod paths;
pub mod registry;

#[cfg(test)]
pub(crate) mod image;

pub use error::CacheError;
pub use file::{CacheFile, CacheStats};
pub use paths::SearchPath;
pub use registry::CacheRegistry;
