//! Database connection and operations.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use thiserror::Error;

use super::finder::FindOpts;
use super::schema::{SchemaError, init_schema};
use super::traits::{Finder, Indexer};
use super::types::{FileRecord, Match, NoteMetadata, format_timestamp, parse_timestamp};
use crate::sink::{ErrorSink, TracingSink};

/// Rows fetched per round trip by [`Indexer::indexed`].
const PAGE_SIZE: usize = 256;

const SELECT_NOTE: &str = "SELECT id, path, title, lead, body, word_count, checksum, metadata, created, modified
     FROM notes WHERE path = ?1";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Note already indexed: {0}")]
    Conflict(String),

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Invalid search query {query:?}: {source}")]
    Query {
        query: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Note index database handle.
pub struct IndexDb {
    conn: Connection,
    sink: Box<dyn ErrorSink>,
}

impl IndexDb {
    /// Open or create an index database at the given path.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        init_schema(&conn)?;
        Ok(Self { conn, sink: Box::new(TracingSink) })
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, IndexError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn, sink: Box::new(TracingSink) })
    }

    /// Replace the sink receiving rows skipped while reading.
    pub fn with_error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Operations running directly on the connection, each in its own
    /// implicit transaction.
    pub fn store(&self) -> NoteStore<'_> {
        NoteStore { conn: &self.conn, sink: self.sink.as_ref() }
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls every write back otherwise.
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<IndexError>,
        F: FnOnce(&NoteStore<'_>) -> Result<T, E>,
    {
        let tx = self.conn.transaction().map_err(IndexError::from)?;
        let store = NoteStore { conn: &tx, sink: self.sink.as_ref() };

        let value = f(&store)?;

        tx.commit().map_err(IndexError::from)?;
        Ok(value)
    }
}

/// Note operations bound to a connection or an open transaction.
pub struct NoteStore<'c> {
    conn: &'c Connection,
    sink: &'c dyn ErrorSink,
}

impl NoteStore<'_> {
    /// Get an indexed note by its path.
    pub fn get_note(&self, path: &str) -> Result<Option<NoteMetadata>, IndexError> {
        self.conn
            .prepare_cached(SELECT_NOTE)?
            .query_row([path], row_to_note)
            .optional()
            .map_err(Into::into)
    }

    /// Sink receiving entries skipped by this store.
    pub fn sink(&self) -> &dyn ErrorSink {
        self.sink
    }

    pub fn count_notes(&self) -> Result<usize, IndexError> {
        let count: i64 =
            self.conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl Indexer for NoteStore<'_> {
    fn indexed(&self) -> impl Iterator<Item = Result<FileRecord, IndexError>> + '_ {
        IndexedRecords {
            conn: self.conn,
            sink: self.sink,
            page: Vec::new().into_iter(),
            last: String::new(),
            exhausted: false,
        }
    }

    fn add(&self, note: &NoteMetadata) -> Result<i64, IndexError> {
        let metadata = metadata_json(note)?;
        let result = self
            .conn
            .prepare_cached(
                "INSERT INTO notes (path, title, lead, body, word_count, checksum, metadata, created, modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?
            .execute(params![
                note.path,
                note.title,
                note.lead,
                note.body,
                note.word_count as i64,
                note.checksum,
                metadata,
                format_timestamp(&note.created),
                format_timestamp(&note.modified),
            ]);

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => Err(IndexError::Conflict(note.path.clone())),
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, note: &NoteMetadata) -> Result<(), IndexError> {
        let metadata = metadata_json(note)?;
        let rows = self
            .conn
            .prepare_cached(
                "UPDATE notes SET
                    title = ?2, lead = ?3, body = ?4, word_count = ?5,
                    checksum = ?6, metadata = ?7, modified = ?8
                 WHERE path = ?1",
            )?
            .execute(params![
                note.path,
                note.title,
                note.lead,
                note.body,
                note.word_count as i64,
                note.checksum,
                metadata,
                format_timestamp(&note.modified),
            ])?;

        if rows == 0 {
            return Err(IndexError::NotFound(note.path.clone()));
        }
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), IndexError> {
        let rows = self.conn.prepare_cached("DELETE FROM notes WHERE path = ?1")?.execute([path])?;

        if rows == 0 {
            return Err(IndexError::NotFound(path.to_string()));
        }
        Ok(())
    }
}

impl Finder for NoteStore<'_> {
    fn find<E, F>(&self, opts: &FindOpts, mut on_match: F) -> Result<usize, E>
    where
        E: From<IndexError>,
        F: FnMut(Match) -> Result<(), E>,
    {
        let plan = opts.plan()?;
        let to_index_error = |err| query_error(plan.fts_query.as_deref(), err);

        let params: Vec<&dyn ToSql> = plan.params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare_cached(&plan.sql).map_err(to_index_error)?;
        let mut rows = stmt.query(params.as_slice()).map_err(to_index_error)?;

        let mut count = 0;
        while let Some(row) = rows.next().map_err(to_index_error)? {
            let found = match row_to_match(row) {
                Ok(found) => found,
                Err(err) => {
                    self.sink.skipped(&row_context(row), &err);
                    continue;
                }
            };
            on_match(found)?;
            count += 1;
        }

        tracing::debug!("search matched {} notes", count);
        Ok(count)
    }
}

/// Keyset-paged scan of `(path, modified)` in path order.
///
/// Each page restarts after the last path seen, so rows inserted or deleted
/// behind the cursor by the same connection never disturb the scan.
struct IndexedRecords<'a> {
    conn: &'a Connection,
    sink: &'a dyn ErrorSink,
    page: std::vec::IntoIter<FileRecord>,
    last: String,
    exhausted: bool,
}

impl IndexedRecords<'_> {
    fn fetch_page(&mut self) -> Result<(), IndexError> {
        let conn = self.conn;
        let mut stmt = conn
            .prepare_cached("SELECT path, modified FROM notes WHERE path > ?1 ORDER BY path LIMIT ?2")?;
        let mut rows = stmt.query(params![self.last, PAGE_SIZE as i64])?;

        let mut page = Vec::with_capacity(PAGE_SIZE);
        let mut seen = 0;
        while let Some(row) = rows.next()? {
            seen += 1;
            let path: String = row.get(0)?;
            match timestamp_column(row, 1) {
                Ok(modified) => page.push(FileRecord { path: path.clone(), modified }),
                Err(err) => self.sink.skipped(&path, &err),
            }
            self.last = path;
        }

        self.exhausted = seen < PAGE_SIZE;
        self.page = page.into_iter();
        Ok(())
    }
}

impl Iterator for IndexedRecords<'_> {
    type Item = Result<FileRecord, IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.page.next() {
                return Some(Ok(record));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}

fn row_to_note(row: &Row) -> Result<NoteMetadata, rusqlite::Error> {
    let word_count: i64 = row.get(5)?;
    let metadata: String = row.get(7)?;

    Ok(NoteMetadata {
        path: row.get(1)?,
        title: row.get(2)?,
        lead: row.get(3)?,
        body: row.get(4)?,
        word_count: usize::try_from(word_count)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Integer, Box::new(e)))?,
        checksum: row.get(6)?,
        metadata: serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&metadata)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?,
        created: timestamp_column(row, 8)?,
        modified: timestamp_column(row, 9)?,
    })
}

fn row_to_match(row: &Row) -> Result<Match, rusqlite::Error> {
    Ok(Match { metadata: row_to_note(row)?, snippet: row.get(10)? })
}

fn row_context(row: &Row) -> String {
    row.get::<_, String>(1).unwrap_or_else(|_| "<unreadable path>".to_string())
}

fn timestamp_column(row: &Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn metadata_json(note: &NoteMetadata) -> Result<String, IndexError> {
    serde_json::to_string(&note.metadata).map_err(|e| IndexError::InvalidData(e.to_string()))
}

/// Malformed FTS syntax surfaces as a generic `SQLITE_ERROR`; tie it back to
/// the query that caused it. Other failures (busy, I/O, corruption) stay
/// database errors.
fn query_error(fts_query: Option<&str>, err: rusqlite::Error) -> IndexError {
    match fts_query {
        Some(query) if err.sqlite_error_code() == Some(rusqlite::ErrorCode::Unknown) => {
            IndexError::Query { query: query.to_string(), source: err }
        }
        _ => IndexError::Database(err),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
