//! Frontmatter parsing from markdown documents.

use super::types::{Frontmatter, ParsedDocument};
use thiserror::Error;

/// Errors that can occur during frontmatter parsing.
#[derive(Debug, Error)]
pub enum FrontmatterParseError {
    #[error("invalid YAML frontmatter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Split a document into its raw frontmatter block (if any) and the body.
///
/// Frontmatter is delimited by `---` at the start of the document:
/// ```markdown
/// ---
/// key: value
/// ---
/// # Document content
/// ```
/// A block without a closing delimiter is not frontmatter.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let trimmed = content.trim_start();

    let Some(after_first) = trimmed.strip_prefix("---") else {
        return (None, content);
    };

    // Skip the newline after opening ---
    let Some(after_newline) =
        after_first.strip_prefix('\n').or_else(|| after_first.strip_prefix("\r\n"))
    else {
        return (None, content);
    };

    match find_closing_delimiter(after_newline) {
        Some((start, end)) => {
            let yaml = &after_newline[..start];
            let after_closing = &after_newline[end..];
            let body = after_closing
                .strip_prefix('\n')
                .or_else(|| after_closing.strip_prefix("\r\n"))
                .unwrap_or(after_closing);
            (Some(yaml), body)
        }
        None => (None, content),
    }
}

/// Parse frontmatter from markdown content.
pub fn parse(content: &str) -> Result<ParsedDocument, FrontmatterParseError> {
    let (yaml, body) = split(content);

    let frontmatter = match yaml {
        None => None,
        Some(yaml) if yaml.trim().is_empty() => Some(Frontmatter::default()),
        Some(yaml) => Some(serde_yaml::from_str(yaml.trim())?),
    };

    Ok(ParsedDocument { frontmatter, body: body.to_string() })
}

/// Byte range of the closing `---` line content: (line start, line end without newline).
fn find_closing_delimiter(content: &str) -> Option<(usize, usize)> {
    let mut pos = 0;
    for line in content.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if bare.trim() == "---" {
            return Some((pos, pos + bare.len()));
        }
        pos += line.len();
    }
    None
}
