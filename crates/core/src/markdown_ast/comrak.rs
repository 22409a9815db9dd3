use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};

use crate::markdown_ast::types::*;

/// Find all headings in the document, in document order
pub fn find_headings(input: &str) -> Vec<HeadingInfo> {
    let arena = Arena::new();
    let options = default_options();
    let root = parse_document(&arena, input, &options);

    let mut headings = Vec::new();

    for node in root.descendants() {
        let data = node.data.borrow();
        if let NodeValue::Heading(ref heading) = data.value {
            headings.push(HeadingInfo {
                title: collect_text(node).trim().to_string(),
                level: heading.level,
                end_line: data.sourcepos.end.line,
            });
        }
    }

    headings
}

/// Find all inline links in the document, in document order. Images are skipped.
pub fn find_links(input: &str) -> Vec<MarkdownLink> {
    let arena = Arena::new();
    let options = default_options();
    let root = parse_document(&arena, input, &options);

    let mut links = Vec::new();

    for node in root.descendants() {
        if let NodeValue::Link(ref link) = node.data.borrow().value {
            links.push(MarkdownLink {
                text: collect_text(node).trim().to_string(),
                url: link.url.clone(),
                title: link.title.clone(),
            });
        }
    }

    links
}

// --- Internal helpers ---

fn default_options() -> Options<'static> {
    let mut options = Options::default();
    // Enable GFM extensions for compatibility
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    // Parse options
    options.parse.smart = false; // Don't convert quotes/dashes

    options
}

/// Plain text of a node: text and code spans, breaks as spaces.
fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for child in node.descendants() {
        match child.data.borrow().value {
            NodeValue::Text(ref t) => text.push_str(t),
            NodeValue::Code(ref code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text
}
