/// Information about a heading found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingInfo {
    /// The heading text content, inline markup stripped
    pub title: String,
    /// The heading level (1-6)
    pub level: u8,
    /// Last source line of the heading (1-based, the underline for setext headings)
    pub end_line: usize,
}

/// An inline Markdown link `[text](url "title")`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownLink {
    /// Display text, inline markup stripped
    pub text: String,
    /// Destination as written
    pub url: String,
    /// Quoted link title, empty when absent
    pub title: String,
}
