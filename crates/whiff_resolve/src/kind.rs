//! Relation predicates over mimetype names.
//!
//! `is_subclass` consults only the *immediate* parent sets declared in the
//! loaded caches; no transitive closure is computed across inheritance
//! levels. The derived predicates combine it with prefix tests and a fixed
//! table of archive types.

use whiff_common::wellknown;

use crate::resolver::MimeDb;

/// Mimetypes treated as archives. An exhaustive literal list; membership
/// is by exact name, not by pattern or parent relation.
const ARCHIVE_TYPES: &[&str] = &[
    "application/gzip",
    "application/java-archive",
    "application/vnd.debian.binary-package",
    "application/vnd.rar",
    "application/x-7z-compressed",
    "application/x-archive",
    "application/x-arj",
    "application/x-bzip",
    "application/x-bzip2",
    "application/x-bzip-compressed-tar",
    "application/x-cd-image",
    "application/x-compressed-tar",
    "application/x-cpio",
    "application/x-gzip",
    "application/x-iso9660-image",
    "application/x-lha",
    "application/x-lzma",
    "application/x-lzma-compressed-tar",
    "application/x-rar",
    "application/x-rar-compressed",
    "application/x-rpm",
    "application/x-stuffit",
    "application/x-tar",
    "application/x-xz",
    "application/x-xz-compressed-tar",
    "application/x-zstd-compressed-tar",
    "application/zip",
    "application/zstd",
];

impl MimeDb {
    /// Returns `true` if `mime_type` is `parent` itself or declares
    /// `parent` among its immediate supertypes in any loaded cache.
    ///
    /// Deliberately not transitive: a grandparent relation does not count.
    pub fn is_subclass(&self, mime_type: &str, parent: &str) -> bool {
        mime_type == parent || self.registry().lookup_parents(mime_type).contains(&parent)
    }

    /// Textual content: anything under `text/`, or an immediate subclass
    /// of `text/plain`.
    pub fn is_text(&self, mime_type: &str) -> bool {
        mime_type.starts_with("text/") || self.is_subclass(mime_type, wellknown::TEXT_PLAIN)
    }

    /// Executable content: the executable sentinel or an immediate
    /// subclass of it (shell scripts, ELF variants, and so on, as declared
    /// by the caches).
    pub fn is_executable(&self, mime_type: &str) -> bool {
        self.is_subclass(mime_type, wellknown::X_EXECUTABLE)
    }

    /// Archive content, by exact membership in the fixed archive table.
    pub fn is_archive(&self, mime_type: &str) -> bool {
        ARCHIVE_TYPES.contains(&mime_type)
    }

    /// Image content (`image/*`).
    pub fn is_image(&self, mime_type: &str) -> bool {
        mime_type.starts_with("image/")
    }

    /// Video content (`video/*`).
    pub fn is_video(&self, mime_type: &str) -> bool {
        mime_type.starts_with("video/")
    }

    /// The unknown sentinel.
    pub fn is_unknown(&self, mime_type: &str) -> bool {
        mime_type == wellknown::OCTET_STREAM
    }
}
