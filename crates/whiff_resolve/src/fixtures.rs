//! Test-only writer for small `mime.cache` images.
//!
//! A deliberately minimal cousin of the full builder in `whiff_cache`'s
//! tests: one optional suffix chain, one optional offset-zero magic value,
//! and flat literal/glob/alias/parent tables. Enough to exercise the
//! resolver's policy without re-testing the format internals here.

use std::path::PathBuf;

use crate::MimeDb;

#[derive(Default)]
pub struct Fixture {
    pub literals: Vec<(String, String)>,
    pub globs: Vec<(String, String)>,
    pub suffix: Option<(String, String)>,
    pub magic: Option<(Vec<u8>, String)>,
    pub aliases: Vec<(String, String)>,
    pub parents: Vec<(String, Vec<String>)>,
}

fn cstr(buf: &mut Vec<u8>, s: &str) -> u32 {
    let off = buf.len() as u32;
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    off
}

fn u32be(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 32];

        // Alias table, sorted by alias name.
        let mut aliases = self.aliases.clone();
        aliases.sort();
        let alias_refs: Vec<(u32, u32)> = aliases
            .iter()
            .map(|(a, c)| (cstr(&mut buf, a), cstr(&mut buf, c)))
            .collect();
        let alias_table = buf.len() as u32;
        u32be(&mut buf, alias_refs.len() as u32);
        for (alias, canonical) in alias_refs {
            u32be(&mut buf, alias);
            u32be(&mut buf, canonical);
        }

        // Parent table, sorted by type name, with per-type offset lists.
        let mut parents = self.parents.clone();
        parents.sort();
        let mut parent_refs = Vec::new();
        for (name, list) in &parents {
            let name_off = cstr(&mut buf, name);
            let offs: Vec<u32> = list.iter().map(|p| cstr(&mut buf, p)).collect();
            let list_off = buf.len() as u32;
            u32be(&mut buf, offs.len() as u32);
            for off in offs {
                u32be(&mut buf, off);
            }
            parent_refs.push((name_off, list_off));
        }
        let parent_table = buf.len() as u32;
        u32be(&mut buf, parent_refs.len() as u32);
        for (name, list) in parent_refs {
            u32be(&mut buf, name);
            u32be(&mut buf, list);
        }

        // Literal table, sorted by filename.
        let mut literals = self.literals.clone();
        literals.sort();
        let literal_refs: Vec<(u32, u32)> = literals
            .iter()
            .map(|(f, m)| (cstr(&mut buf, f), cstr(&mut buf, m)))
            .collect();
        let literal_table = buf.len() as u32;
        u32be(&mut buf, literal_refs.len() as u32);
        for (name, mime) in literal_refs {
            u32be(&mut buf, name);
            u32be(&mut buf, mime);
            u32be(&mut buf, 50);
        }

        // Suffix tree: a single chain of one-node levels ending in a leaf.
        let (root_off, n_roots) = match &self.suffix {
            Some((suffix, mime)) => {
                let mime_off = cstr(&mut buf, mime);
                let mut arr_off = buf.len() as u32;
                u32be(&mut buf, 0);
                u32be(&mut buf, mime_off);
                u32be(&mut buf, 50);
                let mut arr_n = 1u32;
                for ch in suffix.chars() {
                    let off = buf.len() as u32;
                    u32be(&mut buf, ch as u32);
                    u32be(&mut buf, arr_n);
                    u32be(&mut buf, arr_off);
                    arr_off = off;
                    arr_n = 1;
                }
                (arr_off, arr_n)
            }
            None => (0, 0),
        };
        let suffix_table = buf.len() as u32;
        u32be(&mut buf, n_roots);
        u32be(&mut buf, root_off);

        // Glob table, unsorted.
        let glob_refs: Vec<(u32, u32)> = self
            .globs
            .iter()
            .map(|(p, m)| (cstr(&mut buf, p), cstr(&mut buf, m)))
            .collect();
        let glob_table = buf.len() as u32;
        u32be(&mut buf, glob_refs.len() as u32);
        for (pattern, mime) in glob_refs {
            u32be(&mut buf, pattern);
            u32be(&mut buf, mime);
            u32be(&mut buf, 50);
        }

        // Magic table: at most one childless, unmasked rule at offset zero.
        let (magic_count, extent, magic_array) = match &self.magic {
            Some((value, mime)) => {
                let mime_off = cstr(&mut buf, mime);
                let value_off = buf.len() as u32;
                buf.extend_from_slice(value);
                let rule_off = buf.len() as u32;
                u32be(&mut buf, 0); // range start
                u32be(&mut buf, 1); // range length
                u32be(&mut buf, 1); // word size
                u32be(&mut buf, value.len() as u32);
                u32be(&mut buf, value_off);
                u32be(&mut buf, 0); // no mask
                u32be(&mut buf, 0); // no children
                u32be(&mut buf, 0);
                let array_off = buf.len() as u32;
                u32be(&mut buf, 50);
                u32be(&mut buf, mime_off);
                u32be(&mut buf, 1);
                u32be(&mut buf, rule_off);
                (1, value.len() as u32, array_off)
            }
            None => (0, 0, 0),
        };
        let magic_table = buf.len() as u32;
        u32be(&mut buf, magic_count);
        u32be(&mut buf, extent);
        u32be(&mut buf, magic_array);

        let namespace_table = buf.len() as u32;
        u32be(&mut buf, 0);

        buf[0..2].copy_from_slice(&1u16.to_be_bytes());
        buf[2..4].copy_from_slice(&2u16.to_be_bytes());
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

/// Writes the fixture as `<tmp>/mime/mime.cache` and loads a database
/// from it. The `TempDir` must be kept alive for the db's lifetime.
pub fn db_from(fixture: &Fixture) -> (tempfile::TempDir, MimeDb) {
    let dir = tempfile::TempDir::new().unwrap();
    let mime_dir = dir.path().join("mime");
    std::fs::create_dir_all(&mime_dir).unwrap();
    let path: PathBuf = mime_dir.join("mime.cache");
    std::fs::write(&path, fixture.build()).unwrap();
    let db = MimeDb::from_paths(vec![path]);
    (dir, db)
}
