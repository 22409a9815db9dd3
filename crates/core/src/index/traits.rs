//! Ports through which notes are written to and searched in an index.

use super::IndexError;
use super::finder::FindOpts;
use super::types::{FileRecord, Match, NoteMetadata};

/// Write side of the index.
pub trait Indexer {
    /// Every indexed note in ascending byte order of path.
    ///
    /// Rows that cannot be decoded are reported to the error sink and skipped.
    fn indexed(&self) -> impl Iterator<Item = Result<FileRecord, IndexError>> + '_;

    /// Insert a new note and return its row id.
    ///
    /// Fails with [`IndexError::Conflict`] if the path is already indexed.
    fn add(&self, note: &NoteMetadata) -> Result<i64, IndexError>;

    /// Replace the content of an indexed note. Its creation time is kept.
    ///
    /// Fails with [`IndexError::NotFound`] if the path is not indexed.
    fn update(&self, note: &NoteMetadata) -> Result<(), IndexError>;

    /// Fails with [`IndexError::NotFound`] if the path is not indexed.
    fn remove(&self, path: &str) -> Result<(), IndexError>;
}

/// Read side of the index.
pub trait Finder {
    /// Stream the notes selected by `opts` to `on_match`, returning how many
    /// were delivered.
    ///
    /// The first error returned by `on_match` stops the search and is
    /// returned unchanged.
    fn find<E, F>(&self, opts: &FindOpts, on_match: F) -> Result<usize, E>
    where
        E: From<IndexError>,
        F: FnMut(Match) -> Result<(), E>;
}
