//! Note content extraction: title, body, lead, links, checksum.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use super::hasher::content_hash;
use crate::frontmatter::{self, Frontmatter};
use crate::index::types::NoteMetadata;
use crate::markdown_ast::{HeadingInfo, find_headings, find_links};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read note {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Content derived from the raw bytes of a note.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote {
    /// Title from frontmatter or the selected heading, empty when none.
    pub title: String,
    /// Content after the title, surrounding blank lines trimmed.
    pub body: String,
    /// Body up to its first blank line.
    pub lead: String,
    /// Outgoing references found in the body.
    pub links: Vec<Link>,
    /// Frontmatter fields.
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub word_count: usize,
    pub checksum: String,
}

/// Syntax a link was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `[text](target "rels")`
    Markdown,
    /// `[[target|text]]`
    Wikilink,
}

/// A link extracted from a note body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Display text, formatting stripped.
    pub text: String,
    /// Target as written.
    pub target: String,
    /// Relation tags from the quoted link title.
    pub rels: Vec<String>,
    /// Target uses a network scheme.
    pub external: bool,
    pub kind: LinkKind,
}

/// A note read from disk.
#[derive(Debug, Clone)]
pub struct ExtractedNote {
    pub metadata: NoteMetadata,
    pub links: Vec<Link>,
}

// Matches [[target]] or [[target|alias]]
static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap());

static EXTERNAL_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?|ftps?|sftp|ssh|git|wss?)://").unwrap());

/// Read and parse the note at `relative_path` under `root`.
///
/// `relative_path` becomes the note identity and is stored as given.
pub fn extract_note(root: &Path, relative_path: &str) -> Result<ExtractedNote, ExtractError> {
    let absolute = root.join(relative_path);
    let io_err = |source| ExtractError::Io { path: absolute.clone(), source };

    let bytes = std::fs::read(&absolute).map_err(io_err)?;
    let fs_meta = std::fs::metadata(&absolute).map_err(io_err)?;

    let now = Utc::now();
    let modified: DateTime<Utc> = fs_meta.modified().map(Into::into).map_err(io_err)?;
    let created: DateTime<Utc> = fs_meta.created().map(Into::into).unwrap_or(now);

    let parsed = parse_note(&bytes);

    Ok(ExtractedNote {
        metadata: NoteMetadata {
            path: relative_path.to_string(),
            title: parsed.title,
            lead: parsed.lead,
            body: parsed.body,
            word_count: parsed.word_count,
            checksum: parsed.checksum,
            metadata: parsed.metadata,
            created,
            modified,
        },
        links: parsed.links,
    })
}

/// Parse raw note bytes. Invalid UTF-8 sequences are replaced.
pub fn parse_note(raw: &[u8]) -> ParsedNote {
    let content = String::from_utf8_lossy(raw);
    let (frontmatter, markdown) = match frontmatter::parse(&content) {
        Ok(doc) => (doc.frontmatter.unwrap_or_default(), doc.body),
        Err(e) => {
            tracing::debug!("ignoring invalid frontmatter: {}", e);
            (Frontmatter::default(), frontmatter::split(&content).1.to_string())
        }
    };

    let (title, body) = match frontmatter.title() {
        Some(title) => (title.to_string(), trim_blank_lines(&markdown)),
        None => split_title(&markdown),
    };

    let lead = extract_lead(&body);
    let links = extract_links(&body);

    ParsedNote {
        title,
        lead,
        links,
        body,
        metadata: frontmatter.to_json(),
        word_count: content.split_whitespace().count(),
        checksum: content_hash(raw),
    }
}

/// Select the title heading and return it with the content following it.
///
/// The shallowest heading wins, except that the first level-1 heading ends
/// the search and wins outright.
fn split_title(markdown: &str) -> (String, String) {
    let mut selected: Option<HeadingInfo> = None;

    for heading in find_headings(markdown) {
        if heading.title.is_empty() {
            continue;
        }
        if heading.level == 1 {
            selected = Some(heading);
            break;
        }
        if selected.as_ref().is_none_or(|current| heading.level < current.level) {
            selected = Some(heading);
        }
    }

    match selected {
        Some(heading) => {
            let rest = &markdown[line_end_offset(markdown, heading.end_line)..];
            (heading.title, trim_blank_lines(rest))
        }
        None => (String::new(), trim_blank_lines(markdown)),
    }
}

/// Get the byte offset at the end of a line (after newline if present)
fn line_end_offset(input: &str, line_num: usize) -> usize {
    let mut offset = 0;
    for (i, line) in input.split_inclusive('\n').enumerate() {
        offset += line.len();
        if i + 1 == line_num {
            break;
        }
    }
    offset
}

/// Drop whole blank lines at the start and whitespace at the end.
fn trim_blank_lines(text: &str) -> String {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    text[start..].trim_end().to_string()
}

fn extract_lead(body: &str) -> String {
    let mut end = body.len();
    let mut pos = 0;
    for line in body.split_inclusive('\n') {
        if line.trim().is_empty() {
            end = pos;
            break;
        }
        pos += line.len();
    }
    body[..end].trim_end().to_string()
}

fn extract_links(body: &str) -> Vec<Link> {
    let mut links: Vec<Link> = find_links(body)
        .into_iter()
        .map(|link| Link {
            external: is_external(&link.url),
            rels: link.title.split_whitespace().map(str::to_string).collect(),
            text: link.text,
            target: link.url,
            kind: LinkKind::Markdown,
        })
        .collect();

    for cap in WIKILINK_RE.captures_iter(body) {
        let target = cap.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let text = cap.get(2).map(|m| m.as_str().trim()).unwrap_or(target);

        links.push(Link {
            text: text.to_string(),
            target: target.to_string(),
            rels: Vec::new(),
            external: false,
            kind: LinkKind::Wikilink,
        });
    }

    links
}

fn is_external(target: &str) -> bool {
    EXTERNAL_SCHEME_RE.is_match(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use std::fs;
    use tempfile::TempDir;

    fn parse(content: &str) -> ParsedNote {
        parse_note(content.as_bytes())
    }

    #[test]
    fn test_title_from_frontmatter() {
        let note = parse("---\ntitle: My Title\n---\n# Heading\n\nText.\n");
        assert_eq!(note.title, "My Title");
        assert_eq!(note.body, "# Heading\n\nText.");
    }

    #[test]
    fn test_title_key_case_insensitive() {
        let note = parse("---\nTITLE: Shouting\n---\nBody\n");
        assert_eq!(note.title, "Shouting");
    }

    #[test]
    fn test_title_from_first_level_one_heading() {
        let note = parse("## Intro\n\n# Main\n\nContent here.\n\n# Other\n");
        assert_eq!(note.title, "Main");
        assert_eq!(note.body, "Content here.\n\n# Other");
    }

    #[test]
    fn test_title_from_shallowest_heading() {
        let note = parse("### Deep\n\ntext\n\n## Shallow\n\nmore\n\n## Later\n");
        assert_eq!(note.title, "Shallow");
        assert_eq!(note.body, "more\n\n## Later");
    }

    #[test]
    fn test_level_one_wins_over_earlier_shallower() {
        let note = parse("## Two\n\n### Three\n\n# One\n\nrest\n");
        assert_eq!(note.title, "One");
        assert_eq!(note.body, "rest");
    }

    #[test]
    fn test_title_markup_is_stripped() {
        let note = parse("# A **bold** [link](http://x.y) title\n\nBody\n");
        assert_eq!(note.title, "A bold link title");
    }

    #[test]
    fn test_setext_title() {
        let note = parse("Big Title\n=========\n\nBody text\n");
        assert_eq!(note.title, "Big Title");
        assert_eq!(note.body, "Body text");
    }

    #[test]
    fn test_no_title_keeps_whole_body() {
        let note = parse("---\ntags: [x]\n---\n\n\nJust text.\n\nSecond paragraph.\n\n");
        assert_eq!(note.title, "");
        assert_eq!(note.body, "Just text.\n\nSecond paragraph.");
        assert_eq!(note.metadata["tags"], serde_json::json!(["x"]));
    }

    #[test]
    fn test_lead_is_first_paragraph() {
        let note = parse("# T\n\nFirst line\nsecond line\n\nNext paragraph\n");
        assert_eq!(note.lead, "First line\nsecond line");
    }

    #[test]
    fn test_lead_without_blank_line_is_whole_body() {
        let note = parse("# T\n\nOnly paragraph\n");
        assert_eq!(note.lead, "Only paragraph");
    }

    #[test]
    fn test_word_count_covers_raw_text() {
        let note = parse("---\ntitle: Two words\n---\n# Heading\n\none two  three\n");
        // "---", "title:", "Two", "words", "---", "#", "Heading", "one", "two", "three"
        assert_eq!(note.word_count, 10);
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        let note = parse("abc");
        assert_eq!(
            note.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_invalid_frontmatter_is_stripped_and_ignored() {
        let note = parse("---\ntitle: [oops\n---\n# Real\n\nBody\n");
        assert_eq!(note.title, "Real");
        assert!(note.metadata.is_empty());
    }

    #[test]
    fn test_markdown_links() {
        let note = parse(
            "# Note\n\nSee [this *note*](other.md \"uses related\") and \
             [site](https://example.com) and [mail](mailto:a@b.c).\n",
        );

        assert_eq!(note.links.len(), 3);

        assert_eq!(note.links[0].text, "this note");
        assert_eq!(note.links[0].target, "other.md");
        assert_eq!(note.links[0].rels, vec!["uses", "related"]);
        assert!(!note.links[0].external);
        assert_eq!(note.links[0].kind, LinkKind::Markdown);

        assert_eq!(note.links[1].target, "https://example.com");
        assert!(note.links[1].external);
        assert!(note.links[1].rels.is_empty());

        assert!(!note.links[2].external);
    }

    #[test]
    fn test_wikilinks() {
        let note = parse("# Note\n\nLinks to [[other-note]] and [[path/to/x|with alias]].\n");

        assert_eq!(note.links.len(), 2);
        assert_eq!(note.links[0].target, "other-note");
        assert_eq!(note.links[0].text, "other-note");
        assert_eq!(note.links[1].target, "path/to/x");
        assert_eq!(note.links[1].text, "with alias");
        assert_eq!(note.links[1].kind, LinkKind::Wikilink);
    }

    #[test]
    fn test_links_in_title_are_not_body_links() {
        let note = parse("# About [x](x.md)\n\nNothing else.\n");
        assert!(note.links.is_empty());
    }

    #[test]
    fn test_external_schemes() {
        assert!(is_external("http://a"));
        assert!(is_external("HTTPS://a"));
        assert!(is_external("ftp://a"));
        assert!(is_external("ssh://git@host/repo"));
        assert!(!is_external("file:///tmp/a"));
        assert!(!is_external("../notes/a.md"));
        assert!(!is_external("note"));
    }

    #[test]
    fn test_body_snapshot() {
        let note = parse(
            "---\nid: 42\n---\n\n## Reading list\n\n- [Book](book.md)\n- [Paper](https://x.org/p.pdf \"cites\")\n\n> quoted\n",
        );
        assert_snapshot!(note.body, @r#"
        - [Book](book.md)
        - [Paper](https://x.org/p.pdf "cites")

        > quoted
        "#);
    }

    #[test]
    fn test_extract_note_reads_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/n.md"), "# Hello\n\nWorld\n").unwrap();

        let extracted = extract_note(dir.path(), "sub/n.md").unwrap();
        let expected_modified: DateTime<Utc> =
            fs::metadata(dir.path().join("sub/n.md")).unwrap().modified().unwrap().into();

        assert_eq!(extracted.metadata.path, "sub/n.md");
        assert_eq!(extracted.metadata.title, "Hello");
        assert_eq!(extracted.metadata.body, "World");
        assert_eq!(extracted.metadata.modified, expected_modified);
    }

    #[test]
    fn test_extract_note_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = extract_note(dir.path(), "missing.md").unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
