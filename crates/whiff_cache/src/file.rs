//! A single parsed `mime.cache` file and its lookup operations.
//!
//! The cache is a flat binary file: a fixed 32-byte header holding a format
//! version and seven table offsets, followed by tables whose entries address
//! NUL-terminated strings elsewhere in the same file by absolute offset.
//! All integers are big-endian.
//!
//! Loading is fail-safe. A missing or unreadable file, or one with an
//! unsupported version, produces a cache whose table counts are all zero:
//! every lookup reports no-match and nothing faults. Offsets inside a
//! version-valid file are still untrusted; each lookup bounds-checks every
//! read and fails (no-match) on the first malformed offset it touches.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use whiff_common::ByteView;

use crate::error::CacheError;
use crate::glob::pattern_matches;

/// The only cache format version this reader understands.
const SUPPORTED_VERSION: (u16, u16) = (1, 2);

/// Header positions of the seven table offsets.
const HDR_ALIAS: u32 = 4;
const HDR_PARENTS: u32 = 8;
const HDR_LITERALS: u32 = 12;
const HDR_SUFFIX: u32 = 16;
const HDR_GLOBS: u32 = 20;
const HDR_MAGIC: u32 = 24;
const HDR_NAMESPACE: u32 = 28;

/// Entry strides, fixed by the format.
const ALIAS_ENTRY_SIZE: u32 = 8;
const PARENT_ENTRY_SIZE: u32 = 8;
const LITERAL_ENTRY_SIZE: u32 = 12;
const SUFFIX_NODE_SIZE: u32 = 12;
const GLOB_ENTRY_SIZE: u32 = 12;
const MAGIC_ENTRY_SIZE: u32 = 16;
const MAGIC_RULE_SIZE: u32 = 32;

/// Recursion cap for the suffix-tree walk. Real trees are bounded by
/// filename length; a malformed tree must not be able to blow the stack.
const MAX_SUFFIX_DEPTH: usize = 128;

/// Recursion cap for nested magic rules.
const MAX_MAGIC_DEPTH: u32 = 32;

/// Resolved table descriptors: entry-array offsets and entry counts.
///
/// The `Default` value (all zeros) is the empty cache: every count is zero,
/// so every lookup reports no-match.
#[derive(Debug, Default, Clone, Copy)]
struct Tables {
    alias_entries: u32,
    n_aliases: u32,
    parent_entries: u32,
    n_parents: u32,
    literal_entries: u32,
    n_literals: u32,
    suffix_roots: u32,
    n_suffix_roots: u32,
    glob_entries: u32,
    n_globs: u32,
    magic_entries: u32,
    n_magics: u32,
    magic_max_extent: u32,
}

/// One loaded `mime.cache` file.
///
/// Owns the entire file contents; all lookup results are `&str` views into
/// that buffer and live as long as the `CacheFile` is not reloaded (which
/// requires `&mut self`, so outstanding borrows are compiler-enforced to be
/// gone).
#[derive(Debug)]
pub struct CacheFile {
    path: PathBuf,
    view: ByteView,
    tables: Tables,
}

/// Per-table entry counts of a loaded cache, for diagnostic reporting.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    /// Number of literal filename entries.
    pub literals: u32,
    /// Number of glob pattern entries.
    pub globs: u32,
    /// Number of root nodes in the reverse suffix tree.
    pub suffix_roots: u32,
    /// Number of magic (content rule) entries.
    pub magic_entries: u32,
    /// Number of alias entries.
    pub aliases: u32,
    /// Number of parent relation entries.
    pub parents: u32,
    /// The largest number of leading bytes any magic rule inspects.
    pub magic_max_extent: u32,
}

impl CacheFile {
    /// Parses the cache file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the header declares a
    /// version other than 1.2, or the file is too short to hold the header
    /// and table descriptors.
    pub fn parse(path: &Path) -> Result<Self, CacheError> {
        let data = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let view = ByteView::new(data);
        let tables = parse_tables(path, &view)?;
        Ok(Self {
            path: path.to_path_buf(),
            view,
            tables,
        })
    }

    /// Loads the cache file at `path`, degrading to an empty cache on any
    /// failure.
    ///
    /// A missing file is normal (not every data directory ships a mime
    /// cache) and is logged at debug level only. An unsupported version or
    /// truncated header is logged as a warning; either way the returned
    /// cache answers every lookup with no-match.
    pub fn load(path: &Path) -> Self {
        match Self::parse(path) {
            Ok(cache) => {
                debug!(
                    path = %path.display(),
                    literals = cache.tables.n_literals,
                    globs = cache.tables.n_globs,
                    magic = cache.tables.n_magics,
                    "loaded mime cache"
                );
                cache
            }
            Err(CacheError::Io { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %path.display(), "no mime cache present");
                Self::empty(path)
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring unusable mime cache");
                Self::empty(path)
            }
        }
    }

    /// An always-empty cache remembering `path` so it can be reloaded later.
    fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            view: ByteView::default(),
            tables: Tables::default(),
        }
    }

    /// Re-reads the file at this cache's path and replaces the buffer and
    /// descriptors in one assignment; the cache is never partially updated.
    pub fn reload(&mut self) {
        *self = Self::load(&self.path);
    }

    /// The path this cache was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The largest number of leading bytes any magic rule in this file
    /// needs to inspect.
    pub fn magic_max_extent(&self) -> u32 {
        self.tables.magic_max_extent
    }

    /// Returns `true` if every table is empty (missing, unreadable, or
    /// wrong-version files load this way).
    pub fn is_empty(&self) -> bool {
        let t = &self.tables;
        t.n_aliases == 0
            && t.n_parents == 0
            && t.n_literals == 0
            && t.n_suffix_roots == 0
            && t.n_globs == 0
            && t.n_magics == 0
    }

    /// Per-table entry counts for diagnostic reporting.
    pub fn stats(&self) -> CacheStats {
        let t = &self.tables;
        CacheStats {
            literals: t.n_literals,
            globs: t.n_globs,
            suffix_roots: t.n_suffix_roots,
            magic_entries: t.n_magics,
            aliases: t.n_aliases,
            parents: t.n_parents,
            magic_max_extent: t.magic_max_extent,
        }
    }

    /// Looks up an exact literal filename mapping.
    ///
    /// Binary search over the literal table, which is sorted by filename in
    /// ascending byte order. Comparison is exact byte equality, case
    /// sensitive. The entry's weight field is not interpreted.
    pub fn lookup_literal(&self, filename: &str) -> Option<&str> {
        let t = &self.tables;
        let idx = self.name_search(
            t.literal_entries,
            LITERAL_ENTRY_SIZE,
            t.n_literals,
            filename.as_bytes(),
        )?;
        let mime_off = self.entry_field(t.literal_entries, LITERAL_ENTRY_SIZE, idx, 4)?;
        self.view.str_at(mime_off)
    }

    /// Looks up the filename in the reverse suffix tree.
    ///
    /// The tree is keyed on the filename's codepoints folded to lowercase,
    /// read from the last character toward the first. Every leaf reachable
    /// along matching codepoints is a candidate; the one whose suffix starts
    /// earliest in the filename (the longest suffix) wins, so `.tar.gz`
    /// beats `.gz` for the same name.
    ///
    /// Returns the mimetype and the character index at which the matched
    /// suffix begins.
    pub fn lookup_suffix(&self, filename: &str) -> Option<(&str, usize)> {
        let t = &self.tables;
        if t.n_suffix_roots == 0 || filename.is_empty() {
            return None;
        }
        let folded: Vec<char> = filename.chars().map(fold_char).collect();
        let mut best: Option<(u32, usize)> = None;
        self.suffix_walk(t.suffix_roots, t.n_suffix_roots, &folded, 0, 0, &mut best);
        let (mime_off, start) = best?;
        Some((self.view.str_at(mime_off)?, start))
    }

    /// Recursive descent over one sibling-node array of the suffix tree.
    ///
    /// `consumed` counts how many trailing characters of `folded` have been
    /// matched by ancestor levels. A leaf node (codepoint 0) in the current
    /// array records a registered suffix covering exactly those characters,
    /// so it starts at `folded.len() - consumed`.
    fn suffix_walk(
        &self,
        nodes: u32,
        count: u32,
        folded: &[char],
        consumed: usize,
        depth: usize,
        best: &mut Option<(u32, usize)>,
    ) {
        if depth > MAX_SUFFIX_DEPTH {
            return;
        }
        let next = folded.len().checked_sub(consumed + 1);
        for i in 0..count {
            let Some(codepoint) = self.entry_field(nodes, SUFFIX_NODE_SIZE, i, 0) else {
                return;
            };
            if codepoint == 0 {
                let start = folded.len() - consumed;
                let Some(mime_off) = self.entry_field(nodes, SUFFIX_NODE_SIZE, i, 4) else {
                    continue;
                };
                if best.map_or(true, |(_, s)| start < s) {
                    *best = Some((mime_off, start));
                }
            } else if let Some(at) = next {
                if codepoint == folded[at] as u32 {
                    let Some(n_children) = self.entry_field(nodes, SUFFIX_NODE_SIZE, i, 4) else {
                        continue;
                    };
                    let Some(children) = self.entry_field(nodes, SUFFIX_NODE_SIZE, i, 8) else {
                        continue;
                    };
                    self.suffix_walk(children, n_children, folded, consumed + 1, depth + 1, best);
                }
            }
        }
    }

    /// Matches the filename against every glob pattern in the table.
    ///
    /// The table is unsorted, so this is a linear scan. Among matching
    /// patterns the longest pattern string wins (longer means more
    /// specific). Returns the mimetype and the winning pattern's length.
    pub fn lookup_glob(&self, filename: &str) -> Option<(&str, usize)> {
        let t = &self.tables;
        let mut best: Option<(&str, usize)> = None;
        for i in 0..t.n_globs {
            let Some(pattern_off) = self.entry_field(t.glob_entries, GLOB_ENTRY_SIZE, i, 0) else {
                break;
            };
            let Some(pattern) = self.view.str_at(pattern_off) else {
                continue;
            };
            if !pattern_matches(pattern, filename) {
                continue;
            }
            if best.is_some_and(|(_, len)| len >= pattern.len()) {
                continue;
            }
            let Some(mime_off) = self.entry_field(t.glob_entries, GLOB_ENTRY_SIZE, i, 4) else {
                break;
            };
            let Some(mime) = self.view.str_at(mime_off) else {
                continue;
            };
            best = Some((mime, pattern.len()));
        }
        best
    }

    /// Classifies leading file content against the magic rule table.
    ///
    /// Entries are tried in file order and the first whose rule tree matches
    /// wins; the weight field is not used to reorder candidates. A rule
    /// matches if its (optionally masked) value equals the data at any
    /// offset in the rule's range, and, when the rule has children, at
    /// least one child rule also matches.
    pub fn lookup_magic(&self, data: &[u8]) -> Option<&str> {
        let t = &self.tables;
        if data.is_empty() {
            return None;
        }
        for i in 0..t.n_magics {
            let Some(mime_off) = self.entry_field(t.magic_entries, MAGIC_ENTRY_SIZE, i, 4) else {
                break;
            };
            let Some(n_rules) = self.entry_field(t.magic_entries, MAGIC_ENTRY_SIZE, i, 8) else {
                break;
            };
            let Some(rules) = self.entry_field(t.magic_entries, MAGIC_ENTRY_SIZE, i, 12) else {
                break;
            };
            let n_rules = self.cap_count(n_rules, MAGIC_RULE_SIZE);
            if (0..n_rules).any(|r| self.magic_rule_matches(rules, r, data, 0)) {
                if let Some(mime) = self.view.str_at(mime_off) {
                    return Some(mime);
                }
            }
        }
        None
    }

    /// Evaluates one magic rule (and, transitively, its children) against
    /// the data. Any malformed offset fails the rule.
    fn magic_rule_matches(&self, rules: u32, index: u32, data: &[u8], depth: u32) -> bool {
        if depth >= MAX_MAGIC_DEPTH {
            return false;
        }
        let Some(range_start) = self.entry_field(rules, MAGIC_RULE_SIZE, index, 0) else {
            return false;
        };
        let Some(range_len) = self.entry_field(rules, MAGIC_RULE_SIZE, index, 4) else {
            return false;
        };
        // The word-size field at offset 8 is skipped: multi-byte values are
        // compared as raw bytes, never reinterpreted.
        let Some(value_len) = self.entry_field(rules, MAGIC_RULE_SIZE, index, 12) else {
            return false;
        };
        let Some(value_off) = self.entry_field(rules, MAGIC_RULE_SIZE, index, 16) else {
            return false;
        };
        let Some(mask_off) = self.entry_field(rules, MAGIC_RULE_SIZE, index, 20) else {
            return false;
        };
        let Some(n_children) = self.entry_field(rules, MAGIC_RULE_SIZE, index, 24) else {
            return false;
        };
        let Some(children) = self.entry_field(rules, MAGIC_RULE_SIZE, index, 28) else {
            return false;
        };

        let Some(value) = self.view.slice(value_off, value_len) else {
            return false;
        };
        let mask = if mask_off != 0 {
            match self.view.slice(mask_off, value_len) {
                Some(m) => Some(m),
                None => return false,
            }
        } else {
            None
        };

        let vlen = value_len as usize;
        let start = range_start as usize;
        let end = start.saturating_add(range_len as usize);
        let mut found = false;
        for offset in start..end {
            let Some(window) = data.get(offset..offset + vlen) else {
                break;
            };
            let hit = match mask {
                Some(m) => window
                    .iter()
                    .zip(m)
                    .zip(value)
                    .all(|((d, m), v)| d & m == *v),
                None => window == value,
            };
            if hit {
                found = true;
                break;
            }
        }
        if !found {
            return false;
        }
        if n_children == 0 {
            return true;
        }
        let n_children = self.cap_count(n_children, MAGIC_RULE_SIZE);
        (0..n_children).any(|c| self.magic_rule_matches(children, c, data, depth + 1))
    }

    /// Resolves a mimetype name to its canonical name via the alias table.
    pub fn lookup_alias(&self, mime_type: &str) -> Option<&str> {
        let t = &self.tables;
        let idx = self.name_search(
            t.alias_entries,
            ALIAS_ENTRY_SIZE,
            t.n_aliases,
            mime_type.as_bytes(),
        )?;
        let canonical_off = self.entry_field(t.alias_entries, ALIAS_ENTRY_SIZE, idx, 4)?;
        self.view.str_at(canonical_off)
    }

    /// Returns the immediate declared supertypes of a mimetype.
    ///
    /// Only the directly declared parents are returned; no transitive
    /// closure is computed. An empty vector means the type declares no
    /// parents in this cache.
    pub fn lookup_parents(&self, mime_type: &str) -> Vec<&str> {
        let t = &self.tables;
        let Some(idx) = self.name_search(
            t.parent_entries,
            PARENT_ENTRY_SIZE,
            t.n_parents,
            mime_type.as_bytes(),
        ) else {
            return Vec::new();
        };
        let Some(list_off) = self.entry_field(t.parent_entries, PARENT_ENTRY_SIZE, idx, 4) else {
            return Vec::new();
        };
        let Some(count) = self.view.u32_be(list_off) else {
            return Vec::new();
        };
        (0..self.cap_count(count, 4))
            .filter_map(|i| {
                let off = self.entry_field(list_off, 4, i, 4)?;
                self.view.str_at(off)
            })
            .collect()
    }

    /// Caps an untrusted entry count by how many entries of `stride` bytes
    /// the buffer could possibly hold.
    fn cap_count(&self, count: u32, stride: u32) -> u32 {
        (count as u64).min(self.view.len() as u64 / stride as u64) as u32
    }

    /// Binary search over a table of entries whose first field is the
    /// offset of a name string, sorted ascending by name bytes.
    ///
    /// Returns the matching entry index. Any malformed offset encountered
    /// mid-search fails the whole lookup: the table's ordering can no
    /// longer be trusted.
    fn name_search(&self, entries: u32, stride: u32, count: u32, key: &[u8]) -> Option<u32> {
        let mut lo = 0u32;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let name_off = self.entry_field(entries, stride, mid, 0)?;
            let name = self.view.cstr(name_off)?;
            match key.cmp(name) {
                Ordering::Equal => return Some(mid),
                Ordering::Less => hi = mid,
                Ordering::Greater => lo = mid + 1,
            }
        }
        None
    }

    /// Reads the `u32` field at `base + stride * index + field`, computing
    /// the address in 64 bits so a hostile table cannot wrap the offset.
    fn entry_field(&self, base: u32, stride: u32, index: u32, field: u32) -> Option<u32> {
        let off = base as u64 + stride as u64 * index as u64 + field as u64;
        self.view.u32_be(u32::try_from(off).ok()?)
    }
}

/// Folds one character to lowercase for the suffix tree walk, taking the
/// first codepoint of any multi-character lowercase expansion (tree nodes
/// hold single codepoints).
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Parses the header and resolves all table descriptors.
fn parse_tables(path: &Path, view: &ByteView) -> Result<Tables, CacheError> {
    let truncated = |offset: u32| CacheError::Truncated {
        path: path.to_path_buf(),
        offset,
    };
    let major = view.u16_be(0).ok_or_else(|| truncated(0))?;
    let minor = view.u16_be(2).ok_or_else(|| truncated(2))?;
    if (major, minor) != SUPPORTED_VERSION {
        return Err(CacheError::UnsupportedVersion {
            path: path.to_path_buf(),
            major,
            minor,
        });
    }

    let read = |offset: u32| view.u32_be(offset).ok_or_else(|| truncated(offset));

    let alias_off = read(HDR_ALIAS)?;
    let parent_off = read(HDR_PARENTS)?;
    let literal_off = read(HDR_LITERALS)?;
    let suffix_off = read(HDR_SUFFIX)?;
    let glob_off = read(HDR_GLOBS)?;
    let magic_off = read(HDR_MAGIC)?;
    // The namespace table offset completes the 32-byte header; the table
    // itself is not consulted by this engine.
    read(HDR_NAMESPACE)?;

    // Each table stores its entry count at the table offset. For most
    // tables the entries follow the count directly; the suffix tree stores
    // the root-array offset behind one extra indirection, and the magic
    // table stores its max extent and rule-array offset after the count.
    // Saturating adds: a descriptor near the end of the offset space just
    // produces reads that fail their bounds check.
    Ok(Tables {
        n_aliases: read(alias_off)?,
        alias_entries: alias_off.saturating_add(4),
        n_parents: read(parent_off)?,
        parent_entries: parent_off.saturating_add(4),
        n_literals: read(literal_off)?,
        literal_entries: literal_off.saturating_add(4),
        n_suffix_roots: read(suffix_off)?,
        suffix_roots: read(suffix_off.saturating_add(4))?,
        n_globs: read(glob_off)?,
        glob_entries: glob_off.saturating_add(4),
        n_magics: read(magic_off)?,
        magic_max_extent: read(magic_off.saturating_add(4))?,
        magic_entries: read(magic_off.saturating_add(8))?,
    })
}
