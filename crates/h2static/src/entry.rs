//! Filesystem entries returned by the guarded filesystem.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::FsError;

/// A resolved file or directory.
///
/// Metadata is taken with `stat`, so a symlink reports the type and size of
/// its target. If the entry is a directory, listing it applies the same
/// dotfile and containment policy the entry was opened with.
#[derive(Debug, Clone)]
pub struct Entry {
    abs_path: PathBuf,
    metadata: Metadata,
    hide_dot_files: bool,
    /// Resolved root that children must stay inside, if escapes are disallowed.
    containment: Option<PathBuf>,
}

impl Entry {
    /// Create an entry for an absolute path, with no containment root.
    pub fn new(abs_path: impl Into<PathBuf>, hide_dot_files: bool) -> Result<Self, FsError> {
        Self::with_containment(abs_path.into(), hide_dot_files, None)
    }

    pub(crate) fn with_containment(
        abs_path: PathBuf,
        hide_dot_files: bool,
        containment: Option<PathBuf>,
    ) -> Result<Self, FsError> {
        let metadata = fs::metadata(&abs_path)?;
        Ok(Self {
            abs_path,
            metadata,
            hide_dot_files,
            containment,
        })
    }

    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Base name of the entry, as it appears in its parent directory.
    pub fn name(&self) -> String {
        self.abs_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    pub fn size(&self) -> u64 {
        self.metadata.len()
    }

    /// List the children of a directory entry.
    ///
    /// Entries that fail to stat, dotfiles (when hidden), special files and
    /// symlinks escaping the containment root are skipped. The order of the
    /// result is unspecified.
    pub fn read_dir(&self) -> Result<Vec<Entry>, FsError> {
        // Only names are taken from the directory read: its metadata does
        // not follow symlinks, so every child is stat'ed separately.
        let names = fs::read_dir(&self.abs_path)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let child_path = self.abs_path.join(&name);

            let metadata = match fs::metadata(&child_path) {
                Ok(m) => m,
                Err(err) => {
                    warn!("{}: {}", child_path.display(), err);
                    continue;
                }
            };

            if self.hide_dot_files && name.to_string_lossy().starts_with('.') {
                continue;
            }

            if !(metadata.is_dir() || metadata.is_file()) {
                continue;
            }

            if let Some(root) = &self.containment {
                match fs::canonicalize(&child_path) {
                    Ok(resolved) if resolved.starts_with(root) => {}
                    Ok(resolved) => {
                        debug!(
                            "Skipping {} which resolves outside root to {}",
                            child_path.display(),
                            resolved.display()
                        );
                        continue;
                    }
                    Err(err) => {
                        warn!("{}: {}", child_path.display(), err);
                        continue;
                    }
                }
            }

            entries.push(Entry {
                abs_path: child_path,
                metadata,
                hide_dot_files: self.hide_dot_files,
                containment: self.containment.clone(),
            });
        }

        Ok(entries)
    }
}
