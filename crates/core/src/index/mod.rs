//! Incremental note index with full-text search.
//!
//! The index lives in SQLite: one `notes` row per note file plus an FTS5
//! shadow table kept in sync by triggers. An indexing run walks the notebook,
//! diffs it against the stored snapshot and applies the changes in a single
//! transaction.
//!
//! # Example
//!
//! ```no_run
//! use slipbox_core::index::{Filter, FindOpts, Finder, IndexBuilder, IndexDb, IndexError};
//! use slipbox_core::vault::VaultWalker;
//! use std::path::Path;
//!
//! let walker = VaultWalker::new(Path::new("notes"), "md").unwrap();
//! let mut db = IndexDb::open(Path::new("notes/.slipbox/index.db")).unwrap();
//! IndexBuilder::new(&mut db, &walker).run(None).unwrap();
//!
//! let opts = FindOpts { filters: vec![Filter::Match("rust -async".into())], ..Default::default() };
//! db.store()
//!     .find(&opts, |m| {
//!         println!("{}: {}", m.metadata.path, m.snippet);
//!         Ok::<_, IndexError>(())
//!     })
//!     .unwrap();
//! ```

pub mod builder;
pub mod db;
pub mod diff;
pub mod finder;
pub mod fts_query;
pub mod schema;
pub mod traits;
pub mod types;

pub use builder::{BuilderError, IndexBuilder, IndexStats, ProgressCallback};
pub use db::{IndexDb, IndexError, NoteStore};
pub use diff::diff;
pub use finder::{
    DateDirection, DateField, Filter, FindOpts, ParseSorterError, SortField, Sorter,
};
pub use fts_query::convert_query;
pub use schema::{SCHEMA_VERSION, SchemaError};
pub use traits::{Finder, Indexer};
pub use types::{Change, ChangeKind, FileRecord, Match, NoteMetadata};
