//! Test-only builder for synthetic `mime.cache` version 1.2 images.
//!
//! Assembles a structurally valid cache file in memory: header, interned
//! NUL-terminated string pool, and the alias/parent/literal/suffix/glob/
//! magic tables with correct strides and offsets. Tables are emitted with
//! their entry arrays contiguous; strings and sub-arrays land wherever the
//! cursor happens to be, which is exactly what absolute offsets allow.
//!
//! This exists purely so the reader can be exercised against real binary
//! images; it is not a cache writer.

use std::collections::BTreeMap;

/// Declarative description of one magic entry: a mimetype plus the
/// top-level rules, any of which may satisfy the entry.
pub struct MagicSpec {
    pub mime: String,
    pub rules: Vec<RuleSpec>,
}

/// One magic rule. The value must equal the data (under the optional
/// byte-wise mask) at some offset in `[range_start, range_start + range_len)`;
/// if `children` is non-empty, at least one child must also match.
pub struct RuleSpec {
    pub range_start: u32,
    pub range_len: u32,
    pub value: Vec<u8>,
    pub mask: Option<Vec<u8>>,
    pub children: Vec<RuleSpec>,
}

impl RuleSpec {
    /// A childless, unmasked rule matching `value` at exactly `offset`.
    pub fn value_at(offset: u32, value: &[u8]) -> Self {
        Self {
            range_start: offset,
            range_len: 1,
            value: value.to_vec(),
            mask: None,
            children: Vec::new(),
        }
    }
}

/// Builder collecting table entries, then assembling the binary image.
pub struct ImageBuilder {
    version: (u16, u16),
    literals: Vec<(String, String)>,
    globs: Vec<(String, String)>,
    suffixes: Vec<(String, String)>,
    aliases: Vec<(String, String)>,
    parents: Vec<(String, Vec<String>)>,
    magic: Vec<MagicSpec>,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            version: (1, 2),
            literals: Vec::new(),
            globs: Vec::new(),
            suffixes: Vec::new(),
            aliases: Vec::new(),
            parents: Vec::new(),
            magic: Vec::new(),
        }
    }

    /// Overrides the header version (for unsupported-version fixtures).
    pub fn version(mut self, major: u16, minor: u16) -> Self {
        self.version = (major, minor);
        self
    }

    pub fn literal(mut self, filename: &str, mime: &str) -> Self {
        self.literals.push((filename.into(), mime.into()));
        self
    }

    pub fn glob(mut self, pattern: &str, mime: &str) -> Self {
        self.globs.push((pattern.into(), mime.into()));
        self
    }

    /// Registers a suffix (e.g. `".tar.gz"`); supply it lowercase, as
    /// `update-mime-database` stores case-folded codepoints.
    pub fn suffix(mut self, suffix: &str, mime: &str) -> Self {
        self.suffixes.push((suffix.into(), mime.into()));
        self
    }

    pub fn alias(mut self, alias: &str, canonical: &str) -> Self {
        self.aliases.push((alias.into(), canonical.into()));
        self
    }

    pub fn parent(mut self, mime: &str, parents: &[&str]) -> Self {
        self.parents
            .push((mime.into(), parents.iter().map(|p| p.to_string()).collect()));
        self
    }

    pub fn magic(mut self, spec: MagicSpec) -> Self {
        self.magic.push(spec);
        self
    }

    /// Assembles the image.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 32];
        let mut pool: BTreeMap<String, u32> = BTreeMap::new();

        // Alias table: sorted by alias name, stride 8.
        let mut aliases = self.aliases.clone();
        aliases.sort_by(|a, b| a.0.cmp(&b.0));
        let alias_entries: Vec<(u32, u32)> = aliases
            .iter()
            .map(|(a, c)| {
                (
                    intern(&mut buf, &mut pool, a),
                    intern(&mut buf, &mut pool, c),
                )
            })
            .collect();
        let alias_table = buf.len() as u32;
        push_u32(&mut buf, alias_entries.len() as u32);
        for (name, canonical) in alias_entries {
            push_u32(&mut buf, name);
            push_u32(&mut buf, canonical);
        }

        // Parent table: per-type offset lists, then the sorted entry array.
        let mut parents = self.parents.clone();
        parents.sort_by(|a, b| a.0.cmp(&b.0));
        let mut parent_entries = Vec::new();
        for (name, list) in &parents {
            let name_off = intern(&mut buf, &mut pool, name);
            let offs: Vec<u32> = list
                .iter()
                .map(|p| intern(&mut buf, &mut pool, p))
                .collect();
            let list_off = buf.len() as u32;
            push_u32(&mut buf, offs.len() as u32);
            for off in offs {
                push_u32(&mut buf, off);
            }
            parent_entries.push((name_off, list_off));
        }
        let parent_table = buf.len() as u32;
        push_u32(&mut buf, parent_entries.len() as u32);
        for (name, list) in parent_entries {
            push_u32(&mut buf, name);
            push_u32(&mut buf, list);
        }

        // Literal table: sorted by filename, stride 12.
        let mut literals = self.literals.clone();
        literals.sort_by(|a, b| a.0.cmp(&b.0));
        let literal_entries: Vec<(u32, u32)> = literals
            .iter()
            .map(|(f, m)| {
                (
                    intern(&mut buf, &mut pool, f),
                    intern(&mut buf, &mut pool, m),
                )
            })
            .collect();
        let literal_table = buf.len() as u32;
        push_u32(&mut buf, literal_entries.len() as u32);
        for (name, mime) in literal_entries {
            push_u32(&mut buf, name);
            push_u32(&mut buf, mime);
            push_u32(&mut buf, 50);
        }

        // Reverse suffix tree: trie over reversed codepoints, leaves carry
        // the mimetype offset.
        let mut root = TrieNode::default();
        for (suffix, mime) in &self.suffixes {
            let mime_off = intern(&mut buf, &mut pool, mime);
            let mut node = &mut root;
            for ch in suffix.chars().rev() {
                node = node.children.entry(ch as u32).or_default();
            }
            node.leaves.push(mime_off);
        }
        let (root_off, n_roots) = emit_trie(&mut buf, &root);
        let suffix_table = buf.len() as u32;
        push_u32(&mut buf, n_roots);
        push_u32(&mut buf, root_off);

        // Glob table: unsorted, stride 12.
        let glob_entries: Vec<(u32, u32)> = self
            .globs
            .iter()
            .map(|(p, m)| {
                (
                    intern(&mut buf, &mut pool, p),
                    intern(&mut buf, &mut pool, m),
                )
            })
            .collect();
        let glob_table = buf.len() as u32;
        push_u32(&mut buf, glob_entries.len() as u32);
        for (pattern, mime) in glob_entries {
            push_u32(&mut buf, pattern);
            push_u32(&mut buf, mime);
            push_u32(&mut buf, 50);
        }

        // Magic table: rule trees first, then the entry array, then the
        // (count, max extent, entry-array offset) descriptor.
        let mut magic_entries = Vec::new();
        let mut max_extent = 0u32;
        for spec in &self.magic {
            let mime_off = intern(&mut buf, &mut pool, &spec.mime);
            let (rules_off, n_rules) = emit_rules(&mut buf, &spec.rules);
            for rule in &spec.rules {
                max_extent = max_extent.max(rule_extent(rule));
            }
            magic_entries.push((mime_off, n_rules, rules_off));
        }
        let magic_array = buf.len() as u32;
        for (mime, n_rules, rules) in &magic_entries {
            push_u32(&mut buf, 50);
            push_u32(&mut buf, *mime);
            push_u32(&mut buf, *n_rules);
            push_u32(&mut buf, *rules);
        }
        let magic_table = buf.len() as u32;
        push_u32(&mut buf, magic_entries.len() as u32);
        push_u32(&mut buf, max_extent);
        push_u32(&mut buf, magic_array);

        // Empty namespace table, unused by the reader.
        let namespace_table = buf.len() as u32;
        push_u32(&mut buf, 0);

        // Patch the header.
        buf[0..2].copy_from_slice(&self.version.0.to_be_bytes());
        buf[2..4].copy_from_slice(&self.version.1.to_be_bytes());
        for (slot, offset) in [
            alias_table,
            parent_table,
            literal_table,
            suffix_table,
            glob_table,
            magic_table,
            namespace_table,
        ]
        .into_iter()
        .enumerate()
        {
            let at = 4 + slot * 4;
            buf[at..at + 4].copy_from_slice(&offset.to_be_bytes());
        }
        buf
    }
}

#[derive(Default)]
struct TrieNode {
    leaves: Vec<u32>,
    children: BTreeMap<u32, TrieNode>,
}

/// Emits the child-node array of `node` (subtrees first) and returns its
/// offset and length. Leaf records precede character records, as written
/// by `update-mime-database`.
fn emit_trie(buf: &mut Vec<u8>, node: &TrieNode) -> (u32, u32) {
    let mut emitted = Vec::new();
    for (codepoint, child) in &node.children {
        let (child_off, n_children) = emit_trie(buf, child);
        emitted.push((*codepoint, n_children, child_off));
    }
    let array_off = buf.len() as u32;
    for mime_off in &node.leaves {
        push_u32(buf, 0);
        push_u32(buf, *mime_off);
        push_u32(buf, 50);
    }
    for (codepoint, n_children, child_off) in emitted {
        push_u32(buf, codepoint);
        push_u32(buf, n_children);
        push_u32(buf, child_off);
    }
    (array_off, (node.leaves.len() + node.children.len()) as u32)
}

/// Emits one contiguous rule array (value/mask blobs and child arrays
/// first) and returns its offset and length.
fn emit_rules(buf: &mut Vec<u8>, rules: &[RuleSpec]) -> (u32, u32) {
    let mut prepared = Vec::new();
    for rule in rules {
        let value_off = push_bytes(buf, &rule.value);
        let mask_off = match &rule.mask {
            Some(mask) => push_bytes(buf, mask),
            None => 0,
        };
        let (child_off, n_children) = if rule.children.is_empty() {
            (0, 0)
        } else {
            emit_rules(buf, &rule.children)
        };
        prepared.push((value_off, mask_off, child_off, n_children));
    }
    let array_off = buf.len() as u32;
    for (rule, (value_off, mask_off, child_off, n_children)) in rules.iter().zip(&prepared) {
        push_u32(buf, rule.range_start);
        push_u32(buf, rule.range_len);
        push_u32(buf, 1);
        push_u32(buf, rule.value.len() as u32);
        push_u32(buf, *value_off);
        push_u32(buf, *mask_off);
        push_u32(buf, *n_children);
        push_u32(buf, *child_off);
    }
    (array_off, rules.len() as u32)
}

/// Deepest byte a rule (or any of its children) can read.
fn rule_extent(rule: &RuleSpec) -> u32 {
    let own = if rule.range_len == 0 {
        0
    } else {
        rule.range_start + rule.range_len - 1 + rule.value.len() as u32
    };
    rule.children.iter().map(rule_extent).fold(own, u32::max)
}

fn intern(buf: &mut Vec<u8>, pool: &mut BTreeMap<String, u32>, s: &str) -> u32 {
    if let Some(&off) = pool.get(s) {
        return off;
    }
    let off = buf.len() as u32;
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    pool.insert(s.to_string(), off);
    off
}

fn push_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> u32 {
    let off = buf.len() as u32;
    buf.extend_from_slice(bytes);
    off
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_version_and_offsets() {
        let bytes = ImageBuilder::new().build();
        assert_eq!(&bytes[0..4], &[0, 1, 0, 2]);
        // All seven table offsets point inside the image.
        for slot in 0..7 {
            let at = 4 + slot * 4;
            let off = u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap()) as usize;
            assert!(off >= 32 && off < bytes.len(), "table {slot} at {off}");
        }
    }

    #[test]
    fn strings_are_interned_once() {
        let bytes = ImageBuilder::new()
            .glob("*.txt", "text/plain")
            .suffix(".txt", "text/plain")
            .build();
        let needle: &[u8] = b"text/plain\0";
        let hits = bytes.windows(needle.len()).filter(|w| *w == needle).count();
        assert_eq!(hits, 1);
    }
}
