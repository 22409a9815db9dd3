//! Index building orchestration.

use std::time::Instant;

use thiserror::Error;

use super::db::{IndexDb, IndexError};
use super::diff::diff;
use super::traits::Indexer;
use super::types::{Change, ChangeKind};
use crate::sink::ErrorSink;
use crate::vault::{ExtractError, VaultWalker, VaultWalkerError, extract_note};

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("Vault walker error: {0}")]
    Walker(#[from] VaultWalkerError),

    #[error("Index database error: {0}")]
    Index(#[from] IndexError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl BuilderError {
    /// Failures confined to a single note, which is skipped instead of
    /// aborting the run.
    fn is_note_local(&self) -> bool {
        matches!(
            self,
            Self::Extract(_) | Self::Index(IndexError::Conflict(_) | IndexError::NotFound(_))
        )
    }
}

/// Statistics from an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    /// Changes that could not be applied.
    pub skipped: usize,
    /// Links found in added and modified notes.
    pub links_found: usize,
    /// Indexing duration in milliseconds.
    pub duration_ms: u64,
}

impl IndexStats {
    /// Number of changes applied to the index.
    pub fn changes(&self) -> usize {
        self.added + self.modified + self.removed
    }
}

/// Progress callback for indexing runs.
/// Parameters: (changes seen so far, current change)
pub type ProgressCallback = Box<dyn Fn(usize, &Change)>;

/// Brings the index in line with the notes on disk.
pub struct IndexBuilder<'a> {
    db: &'a mut IndexDb,
    walker: &'a VaultWalker,
}

impl<'a> IndexBuilder<'a> {
    /// Create a new index builder.
    pub fn new(db: &'a mut IndexDb, walker: &'a VaultWalker) -> Self {
        Self { db, walker }
    }

    /// Index every note added, modified or removed since the last run.
    ///
    /// The whole run is one transaction. Notes that cannot be read or stored
    /// are reported to the database's error sink and counted as skipped; any
    /// other failure rolls the run back.
    pub fn run(&mut self, progress: Option<ProgressCallback>) -> Result<IndexStats, BuilderError> {
        let start = Instant::now();
        let walker = self.walker;

        let mut stats = self
            .db
            .transaction(|store| sync(store, walker, store.sink(), progress.as_ref()))?;

        stats.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "indexed {}: {} added, {} modified, {} removed, {} skipped in {}ms",
            walker.root().display(),
            stats.added,
            stats.modified,
            stats.removed,
            stats.skipped,
            stats.duration_ms
        );
        Ok(stats)
    }
}

/// Apply every difference between `walker` and `indexer` to `indexer`.
fn sync<I: Indexer>(
    indexer: &I,
    walker: &VaultWalker,
    sink: &dyn ErrorSink,
    progress: Option<&ProgressCallback>,
) -> Result<IndexStats, BuilderError> {
    let mut stats = IndexStats::default();
    let mut seen = 0;

    let source = walker.walk(sink).map(Ok);
    let target = indexer.indexed().map(|r| r.map_err(BuilderError::from));

    diff(source, target, |change| {
        seen += 1;
        tracing::debug!("{}", change);
        if let Some(cb) = progress {
            cb(seen, &change);
        }

        match apply(indexer, walker, &change) {
            Ok(links) => {
                stats.links_found += links;
                match change.kind {
                    ChangeKind::Added => stats.added += 1,
                    ChangeKind::Modified => stats.modified += 1,
                    ChangeKind::Removed => stats.removed += 1,
                }
                Ok(())
            }
            Err(err) if err.is_note_local() => {
                sink.skipped(&change.path, &err);
                stats.skipped += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    })?;

    Ok(stats)
}

/// Returns the number of links found in the note.
fn apply<I: Indexer>(
    indexer: &I,
    walker: &VaultWalker,
    change: &Change,
) -> Result<usize, BuilderError> {
    match change.kind {
        ChangeKind::Added => {
            let note = extract_note(walker.root(), &change.path)?;
            indexer.add(&note.metadata)?;
            Ok(note.links.len())
        }
        ChangeKind::Modified => {
            let note = extract_note(walker.root(), &change.path)?;
            indexer.update(&note.metadata)?;
            Ok(note.links.len())
        }
        ChangeKind::Removed => {
            indexer.remove(&change.path)?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::{FileRecord, NoteMetadata};
    use crate::sink::MemorySink;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn create_test_vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(
            root.join("note1.md"),
            "---\ntitle: Note One\n---\n\nThis links to [[note2]] and [[missing-note]].\n",
        )
        .unwrap();
        fs::write(root.join("note2.md"), "# Note Two\n\nBack to [[note1]].\n").unwrap();
        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(
            root.join("subdir/note3.md"),
            "# Note Three\n\nLinks to [Note One](../note1.md).\n",
        )
        .unwrap();

        dir
    }

    fn touch(path: &std::path::Path, contents: &str) {
        fs::write(path, contents).unwrap();
        let later = SystemTime::now() + Duration::from_secs(60);
        fs::File::options().write(true).open(path).unwrap().set_modified(later).unwrap();
    }

    #[test]
    fn test_first_run_adds_everything() {
        let vault = create_test_vault();
        let walker = VaultWalker::new(vault.path(), "md").unwrap();
        let mut db = IndexDb::open_in_memory().unwrap();

        let stats = IndexBuilder::new(&mut db, &walker).run(None).unwrap();

        assert_eq!((stats.added, stats.modified, stats.removed, stats.skipped), (3, 0, 0, 0));
        assert_eq!(stats.links_found, 4);

        let store = db.store();
        assert_eq!(store.count_notes().unwrap(), 3);
        assert_eq!(store.get_note("note1.md").unwrap().unwrap().title, "Note One");
        assert_eq!(store.get_note("subdir/note3.md").unwrap().unwrap().title, "Note Three");
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let vault = create_test_vault();
        let walker = VaultWalker::new(vault.path(), "md").unwrap();
        let mut db = IndexDb::open_in_memory().unwrap();

        IndexBuilder::new(&mut db, &walker).run(None).unwrap();
        let stats = IndexBuilder::new(&mut db, &walker).run(None).unwrap();

        assert_eq!(stats.changes(), 0);
        assert_eq!(db.store().count_notes().unwrap(), 3);
    }

    #[test]
    fn test_incremental_run() {
        let vault = create_test_vault();
        let root = vault.path();
        let walker = VaultWalker::new(root, "md").unwrap();
        let mut db = IndexDb::open_in_memory().unwrap();
        IndexBuilder::new(&mut db, &walker).run(None).unwrap();
        let created = db.store().get_note("note2.md").unwrap().unwrap().created;

        touch(&root.join("note2.md"), "# Note Two, revised\n\nNew text.\n");
        fs::remove_file(root.join("subdir/note3.md")).unwrap();
        fs::write(root.join("note4.md"), "# Note Four\n").unwrap();

        let changes = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&changes);
        let progress: ProgressCallback =
            Box::new(move |_: usize, change: &Change| recorded.borrow_mut().push(change.to_string()));

        let stats = IndexBuilder::new(&mut db, &walker).run(Some(progress)).unwrap();

        assert_eq!((stats.added, stats.modified, stats.removed), (1, 1, 1));
        assert_eq!(
            *changes.borrow(),
            vec!["modified note2.md", "added note4.md", "removed subdir/note3.md"]
        );

        let store = db.store();
        let note2 = store.get_note("note2.md").unwrap().unwrap();
        assert_eq!(note2.title, "Note Two, revised");
        assert_eq!(note2.created, created);
        assert!(store.get_note("subdir/note3.md").unwrap().is_none());
        assert!(store.get_note("note4.md").unwrap().is_some());
    }

    #[test]
    fn test_storage_failure_rolls_back_run() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.md"), "# A\n").unwrap();
        let walker = VaultWalker::new(root, "md").unwrap();
        let mut db = IndexDb::open_in_memory().unwrap();
        IndexBuilder::new(&mut db, &walker).run(None).unwrap();

        fs::remove_file(root.join("a.md")).unwrap();
        fs::write(root.join("b.md"), "# B\n").unwrap();
        db.connection()
            .execute_batch(
                "DROP TRIGGER notes_ai;
                 CREATE TRIGGER notes_ai AFTER INSERT ON notes BEGIN
                     SELECT RAISE(ABORT, 'storage unavailable');
                 END;",
            )
            .unwrap();

        let err = IndexBuilder::new(&mut db, &walker).run(None).unwrap_err();

        assert!(matches!(err, BuilderError::Index(IndexError::Database(_))));
        let paths: Vec<_> = db.store().indexed().map(|r| r.unwrap().path).collect();
        assert_eq!(paths, vec!["a.md"]);
    }

    /// Indexer rejecting every write as a conflict.
    struct Conflicting;

    impl Indexer for Conflicting {
        fn indexed(&self) -> impl Iterator<Item = Result<FileRecord, IndexError>> + '_ {
            std::iter::empty()
        }

        fn add(&self, note: &NoteMetadata) -> Result<i64, IndexError> {
            Err(IndexError::Conflict(note.path.clone()))
        }

        fn update(&self, note: &NoteMetadata) -> Result<(), IndexError> {
            Err(IndexError::NotFound(note.path.clone()))
        }

        fn remove(&self, path: &str) -> Result<(), IndexError> {
            Err(IndexError::NotFound(path.to_string()))
        }
    }

    #[test]
    fn test_note_conflicts_are_skipped() {
        let vault = create_test_vault();
        let walker = VaultWalker::new(vault.path(), "md").unwrap();
        let sink = MemorySink::new();

        let stats = sync(&Conflicting, &walker, &sink, None).unwrap();

        assert_eq!(stats.skipped, 3);
        assert_eq!(stats.changes(), 0);
        let skipped: Vec<_> = sink.entries().into_iter().map(|e| e.context).collect();
        assert_eq!(skipped, vec!["note1.md", "note2.md", "subdir/note3.md"]);
    }
}
