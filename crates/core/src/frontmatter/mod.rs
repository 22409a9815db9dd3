//! Front matter splitting and parsing.
//!
//! Notes may open with a YAML block delimited by `---` lines. The block is
//! stripped from the content before any Markdown processing.

pub mod parser;
pub mod types;

pub use parser::{FrontmatterParseError, parse, split};
pub use types::{Frontmatter, ParsedDocument};
