//! Access to files and directories under a root directory.
//!
//! The filesystem can optionally:
//!
//! - serve `.html`/`.htm` files for the corresponding path without suffix,
//!   when the original path is not found
//! - hide dotfiles
//! - allow access to files and directories outside the root via symlinks

use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::entry::Entry;
use crate::error::FsError;

const HTML_SUFFIXES: [&str; 2] = [".html", ".htm"];

#[derive(Debug, Clone)]
pub struct GuardedFilesystem {
    /// Absolute path of the served directory
    pub root: PathBuf,
    /// Look up `<path>.html` and `<path>.htm` when `<path>` is missing
    pub resolve_html: bool,
    /// Treat any path segment starting with a dot as missing
    pub hide_dot_files: bool,
    /// Follow symlinks whose target resolves outside the root
    pub allow_outside_symlinks: bool,
}

impl GuardedFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resolve_html: true,
            hide_dot_files: true,
            allow_outside_symlinks: false,
        }
    }

    /// Open the entry for a request path.
    ///
    /// The path is always treated as rooted at `/` and cleaned lexically, so
    /// `..` never climbs above the root. If the path is missing and HTML
    /// resolution is enabled, the `.html` and `.htm` variants are tried in
    /// that order.
    pub fn open(&self, name: &str) -> Result<Entry, FsError> {
        if self.hide_dot_files && contains_dot_file(name) {
            // Even if the file exists
            return Err(FsError::NotFound);
        }

        match self.check_exists(name) {
            Ok(_) => self.new_entry(name),
            Err(FsError::NotFound) if self.resolve_html && !has_html_suffix(name) => {
                HTML_SUFFIXES
                    .iter()
                    .find_map(|suffix| self.open_file(&format!("{name}{suffix}")).ok())
                    .ok_or(FsError::NotFound)
            }
            Err(err) => Err(err),
        }
    }

    /// Open the entry for a request path, only if it is not a directory.
    pub fn open_file(&self, name: &str) -> Result<Entry, FsError> {
        if self.hide_dot_files && contains_dot_file(name) {
            return Err(FsError::NotFound);
        }

        match self.check_exists(name) {
            Ok(metadata) if !metadata.is_dir() => {}
            _ => return Err(FsError::NotFound),
        }

        let entry = self.new_entry(name)?;
        if entry.is_dir() {
            return Err(FsError::NotFound);
        }
        Ok(entry)
    }

    /// Absolute, unresolved location of a request path under the root.
    fn full_path(&self, name: &str) -> Result<PathBuf, FsError> {
        if MAIN_SEPARATOR != '/' && name.contains(MAIN_SEPARATOR) {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid character in file path: {name}"),
            )));
        }

        let cleaned = clean_path(name);
        let relative = cleaned.trim_start_matches('/');
        if relative.is_empty() {
            Ok(self.root.clone())
        } else {
            Ok(self.root.join(relative))
        }
    }

    /// Check that the path exists and can be opened for reading.
    fn check_exists(&self, name: &str) -> Result<fs::Metadata, FsError> {
        let full_path = self.full_path(name)?;
        let metadata = fs::metadata(&full_path)?;
        if metadata.is_dir() {
            fs::read_dir(&full_path)?;
        } else {
            fs::File::open(&full_path)?;
        }
        Ok(metadata)
    }

    fn new_entry(&self, name: &str) -> Result<Entry, FsError> {
        let path = resolve_path(&self.full_path(name)?)?;
        if self.allow_outside_symlinks {
            return Entry::with_containment(path, self.hide_dot_files, None);
        }

        let root = resolve_path(&self.root)?;
        if !path.starts_with(&root) {
            return Err(FsError::PermissionDenied);
        }
        Entry::with_containment(path, self.hide_dot_files, Some(root))
    }
}

/// Resolve symlinks and return the absolute path.
fn resolve_path(path: &Path) -> Result<PathBuf, FsError> {
    Ok(fs::canonicalize(path)?)
}

/// Clean a slash-separated path lexically, rooting it at `/`.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment;
/// a `..` at the root stays at the root.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Whether any slash-separated segment of the path starts with a dot.
fn contains_dot_file(name: &str) -> bool {
    name.split('/').any(|part| part.starts_with('.'))
}

fn has_html_suffix(name: &str) -> bool {
    HTML_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
