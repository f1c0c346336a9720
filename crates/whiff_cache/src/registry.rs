//! The priority-ordered set of cache files searched together.
//!
//! One [`CacheFile`] is loaded per configured data directory, user cache
//! first. Merged lookups combine the member results with the tie-break
//! rules the format prescribes: literal and magic stop at the first cache
//! with a match, suffix and glob pick the best match across all caches,
//! and parent relations are unioned.

use std::path::PathBuf;

use tracing::debug;

use crate::file::CacheFile;
use crate::paths::SearchPath;

/// An ordered collection of loaded cache files.
///
/// Membership is fixed between construction and drop; individual members
/// are replaced wholesale by [`reload_all`](Self::reload_all). Lookups
/// borrow `&self`, reload takes `&mut self`, so a reload can never race an
/// in-flight lookup.
#[derive(Debug)]
pub struct CacheRegistry {
    caches: Vec<CacheFile>,
    max_magic_extent: u32,
}

impl CacheRegistry {
    /// Discovers and loads the caches named by the process environment
    /// (see [`SearchPath::from_env`]). Never fails: unusable caches load
    /// as empty members.
    pub fn from_env() -> Self {
        Self::from_paths(SearchPath::from_env().cache_files())
    }

    /// Loads one cache per given path, in priority order (first = highest).
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let caches: Vec<CacheFile> = paths.into_iter().map(|p| CacheFile::load(&p)).collect();
        let max_magic_extent = caches
            .iter()
            .map(CacheFile::magic_max_extent)
            .max()
            .unwrap_or(0);
        debug!(
            caches = caches.len(),
            max_magic_extent, "mime cache registry ready"
        );
        Self {
            caches,
            max_magic_extent,
        }
    }

    /// The loaded caches in priority order, for diagnostic reporting.
    pub fn caches(&self) -> &[CacheFile] {
        &self.caches
    }

    /// The largest number of leading bytes any member's magic rules
    /// inspect.
    pub fn max_magic_extent(&self) -> u32 {
        self.max_magic_extent
    }

    /// Reloads every member from its original path and recomputes the
    /// magic extent. Membership and order are unchanged.
    pub fn reload_all(&mut self) {
        for cache in &mut self.caches {
            cache.reload();
        }
        self.max_magic_extent = self
            .caches
            .iter()
            .map(CacheFile::magic_max_extent)
            .max()
            .unwrap_or(0);
        debug!(caches = self.caches.len(), "mime cache registry reloaded");
    }

    /// Exact literal filename lookup; the first cache with a match wins.
    pub fn lookup_literal(&self, filename: &str) -> Option<&str> {
        self.caches.iter().find_map(|c| c.lookup_literal(filename))
    }

    /// Suffix lookup merged across all caches: the match whose suffix
    /// starts earliest in the filename wins, with ties going to the
    /// higher-priority cache.
    pub fn lookup_suffix(&self, filename: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for cache in &self.caches {
            if let Some((mime, start)) = cache.lookup_suffix(filename) {
                if best.map_or(true, |(_, s)| start < s) {
                    best = Some((mime, start));
                }
            }
        }
        best.map(|(mime, _)| mime)
    }

    /// Glob lookup merged across all caches: the longest matching pattern
    /// wins, with ties going to the higher-priority cache.
    pub fn lookup_glob(&self, filename: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for cache in &self.caches {
            if let Some((mime, len)) = cache.lookup_glob(filename) {
                if best.map_or(true, |(_, l)| len > l) {
                    best = Some((mime, len));
                }
            }
        }
        best.map(|(mime, _)| mime)
    }

    /// Content magic lookup, cache by cache in priority order; the first
    /// cache producing any match wins (no cross-cache specificity merge).
    pub fn lookup_magic(&self, data: &[u8]) -> Option<&str> {
        self.caches.iter().find_map(|c| c.lookup_magic(data))
    }

    /// Canonical-name lookup; the first cache declaring an alias wins.
    pub fn lookup_alias(&self, mime_type: &str) -> Option<&str> {
        self.caches.iter().find_map(|c| c.lookup_alias(mime_type))
    }

    /// Union of the immediate parents declared for `mime_type` by any
    /// cache, in priority order, without duplicates.
    pub fn lookup_parents(&self, mime_type: &str) -> Vec<&str> {
        let mut parents: Vec<&str> = Vec::new();
        for cache in &self.caches {
            for parent in cache.lookup_parents(mime_type) {
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
        }
        parents
    }
}
