#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

//! Incremental indexing and full-text search for a slip box of plain-text notes.

pub mod config;
pub mod frontmatter;
pub mod index;
pub mod markdown_ast;
pub mod sink;
pub mod vault;
