//! Recursive vault directory walker.
//!
//! Files are produced lazily, in strictly ascending byte order of their
//! `/`-joined relative path, which is the order the index stores them in.
//! Sorting siblings by name alone is not enough: `a/b.md` must come after
//! `a.md` because `/` sorts after `.`. Directory names are therefore compared
//! as if they ended with `/`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::index::types::FileRecord;
use crate::sink::ErrorSink;

#[derive(Debug, Error)]
pub enum VaultWalkerError {
    #[error("vault root does not exist: {0}")]
    MissingRoot(String),

    #[error("failed to read file metadata {0}: {1}")]
    MetadataError(String, #[source] std::io::Error),
}

/// Walker for discovering note files in a vault.
#[derive(Debug)]
pub struct VaultWalker {
    root: PathBuf,
    /// `.` followed by the note extension.
    suffix: String,
    /// Folders to exclude from walking (relative paths from vault root).
    excluded_folders: Vec<PathBuf>,
}

impl VaultWalker {
    /// Create a new walker for the given vault root and note extension (`md`).
    pub fn new(root: &Path, extension: &str) -> Result<Self, VaultWalkerError> {
        Self::with_exclusions(root, extension, Vec::new())
    }

    /// Create a new walker with folder exclusions.
    ///
    /// Excluded folders can be specified as:
    /// - Relative paths from vault root (e.g., "automations/templates")
    /// - Absolute paths (will be converted to relative)
    pub fn with_exclusions(
        root: &Path,
        extension: &str,
        excluded_folders: Vec<PathBuf>,
    ) -> Result<Self, VaultWalkerError> {
        let root = root
            .canonicalize()
            .map_err(|_| VaultWalkerError::MissingRoot(root.display().to_string()))?;

        if !root.is_dir() {
            return Err(VaultWalkerError::MissingRoot(root.display().to_string()));
        }

        // Normalize exclusions to be relative to root
        let excluded_folders = excluded_folders
            .into_iter()
            .map(|p| {
                if p.is_absolute() {
                    p.strip_prefix(&root).unwrap_or(&p).to_path_buf()
                } else {
                    p
                }
            })
            .collect();

        let suffix = format!(".{}", extension.trim_start_matches('.'));

        Ok(Self { root, suffix, excluded_folders })
    }

    /// Start walking the vault.
    ///
    /// Entries that cannot be read are reported to `sink` and skipped. If the
    /// root itself becomes unreadable the error is reported and the walk ends.
    pub fn walk<'a>(&'a self, sink: &'a dyn ErrorSink) -> Walk<'a> {
        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(compare_entries)
            .into_iter()
            .filter_entry(move |e| !self.is_excluded(e));

        Walk { walker: self, entries: Box::new(entries), sink, done: false }
    }

    /// Check if an entry should be excluded from walking.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        // Never filter the root directory (depth 0)
        if entry.depth() == 0 {
            return false;
        }

        // Skip hidden files and directories
        if entry.file_name().to_string_lossy().starts_with('.') {
            return true;
        }

        // Check against configured exclusions
        if !self.excluded_folders.is_empty()
            && let Ok(relative) = entry.path().strip_prefix(&self.root)
        {
            return self.excluded_folders.iter().any(|excluded| relative.starts_with(excluded));
        }

        false
    }

    /// Get the vault root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record(&self, entry: &DirEntry) -> Result<Option<FileRecord>, VaultWalkerError> {
        let path = entry.path();
        if !path.is_file() || !entry.file_name().to_string_lossy().ends_with(&self.suffix) {
            return Ok(None);
        }

        let modified = path
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| VaultWalkerError::MetadataError(path.display().to_string(), e))?;

        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        Ok(Some(FileRecord {
            path: to_slash_path(relative),
            modified: DateTime::<Utc>::from(modified),
        }))
    }
}

/// Lazy sequence of note files produced by [`VaultWalker::walk`].
pub struct Walk<'a> {
    walker: &'a VaultWalker,
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
    sink: &'a dyn ErrorSink,
    done: bool,
}

impl Iterator for Walk<'_> {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        while !self.done {
            let entry = match self.entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    let context = err
                        .path()
                        .unwrap_or(self.walker.root.as_path())
                        .display()
                        .to_string();
                    self.sink.skipped(&context, &err);
                    if err.depth() == 0 {
                        self.done = true;
                    }
                    continue;
                }
                None => {
                    self.done = true;
                    continue;
                }
            };

            match self.walker.record(&entry) {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(err) => self.sink.skipped(&entry.path().display().to_string(), &err),
            }
        }

        None
    }
}

impl std::iter::FusedIterator for Walk<'_> {}

fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn sort_key(entry: &DirEntry) -> Vec<u8> {
    let mut key = entry.file_name().to_string_lossy().into_owned().into_bytes();
    if entry.file_type().is_dir() {
        key.push(b'/');
    }
    key
}

fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
