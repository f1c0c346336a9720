//! Discovery of `mime.cache` search paths.
//!
//! Follows the XDG base directory convention: the user data directory is
//! searched first so locally installed MIME packages override the system
//! ones, then each system data directory in its configured order. Every
//! data directory contributes one candidate cache at `<dir>/mime/mime.cache`.

use std::env;
use std::path::PathBuf;

/// Fallback system data directories when `$XDG_DATA_DIRS` is unset.
const DEFAULT_DATA_DIRS: [&str; 2] = ["/usr/local/share", "/usr/share"];

/// An ordered list of data directories, highest priority first.
#[derive(Debug, Clone)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Builds the search path from the process environment.
    ///
    /// Order: `$XDG_DATA_HOME` (or `$HOME/.local/share` when unset), then
    /// the entries of `$XDG_DATA_DIRS` (or `/usr/local/share:/usr/share`
    /// when unset). Empty variables count as unset. With neither user
    /// variable available the user directory is simply skipped.
    pub fn from_env() -> Self {
        let mut dirs = Vec::new();

        match env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
            Some(data_home) => dirs.push(PathBuf::from(data_home)),
            None => {
                if let Some(home) = env::var_os("HOME").filter(|v| !v.is_empty()) {
                    dirs.push(PathBuf::from(home).join(".local").join("share"));
                }
            }
        }

        match env::var_os("XDG_DATA_DIRS").filter(|v| !v.is_empty()) {
            Some(list) => {
                dirs.extend(env::split_paths(&list).filter(|p| !p.as_os_str().is_empty()));
            }
            None => dirs.extend(DEFAULT_DATA_DIRS.iter().map(PathBuf::from)),
        }

        Self { dirs }
    }

    /// Builds a search path from explicit data directories, highest
    /// priority first. Used by tests and the CLI's `--mime-dir` override.
    pub fn from_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// The data directories, highest priority first.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// The candidate cache file paths, one per data directory, in priority
    /// order. The files need not exist; missing ones load as empty caches.
    pub fn cache_files(&self) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join("mime").join("mime.cache"))
            .collect()
    }
}
