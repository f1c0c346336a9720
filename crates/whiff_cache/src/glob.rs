//! Shell-style wildcard matching for glob table entries.
//!
//! Glob patterns in the cache use `fnmatch(3)` semantics: `*` matches any
//! run of characters, `?` matches a single character, and `[...]` matches a
//! character class. Matching is case-sensitive; filenames never contain a
//! path separator, so no separator handling applies.

use ::glob::{MatchOptions, Pattern};

/// Matching options for cache glob patterns.
///
/// `require_literal_separator` is off because a bare filename has no `/`,
/// and `require_literal_leading_dot` is off because patterns like `*~`
/// must match dotfiles the same way `fnmatch` without `FNM_PERIOD` does.
const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Returns `true` if `pattern` matches `filename`.
///
/// A syntactically invalid pattern (possible in a corrupt or hand-edited
/// cache) matches nothing.
pub fn pattern_matches(pattern: &str, filename: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(p) => p.matches_with(filename, OPTIONS),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_run() {
        assert!(pattern_matches("*.txt", "notes.txt"));
        assert!(pattern_matches("*.txt", ".txt"));
        assert!(!pattern_matches("*.txt", "notes.txt.bak"));
    }

    #[test]
    fn question_matches_single_char() {
        assert!(pattern_matches("a?c", "abc"));
        assert!(!pattern_matches("a?c", "ac"));
        assert!(!pattern_matches("a?c", "abbc"));
    }

    #[test]
    fn character_class() {
        assert!(pattern_matches("*.p[lm]", "script.pl"));
        assert!(pattern_matches("*.p[lm]", "module.pm"));
        assert!(!pattern_matches("*.p[lm]", "story.pn"));
    }

    #[test]
    fn case_sensitive() {
        assert!(pattern_matches("Makefile.*", "Makefile.am"));
        assert!(!pattern_matches("Makefile.*", "makefile.am"));
    }

    #[test]
    fn leading_dot_not_special() {
        assert!(pattern_matches("*~", ".profile~"));
        assert!(pattern_matches("*.swp", ".main.rs.swp"));
    }

    #[test]
    fn invalid_pattern_matches_nothing() {
        assert!(!pattern_matches("[", "["));
        assert!(!pattern_matches("[", "x"));
    }

    #[test]
    fn literal_pattern() {
        assert!(pattern_matches("core", "core"));
        assert!(!pattern_matches("core", "score"));
    }
}
