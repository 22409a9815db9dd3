//! Vault file discovery and content extraction.
//!
//! This module provides utilities for walking vault directories,
//! extracting metadata from note files, and computing content hashes.

pub mod extractor;
pub mod hasher;
pub mod walker;

pub use extractor::{
    ExtractError, ExtractedNote, Link, LinkKind, ParsedNote, extract_note, parse_note,
};
pub use hasher::content_hash;
pub use walker::{VaultWalker, VaultWalkerError, Walk};
