pub mod comrak;
pub mod types;

// Re-export primary API
pub use comrak::{find_headings, find_links};
pub use types::{HeadingInfo, MarkdownLink};
