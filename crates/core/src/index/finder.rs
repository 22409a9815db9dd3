//! Search options and their compilation into a single SQL statement.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::ToSql;
use thiserror::Error;

use super::IndexError;
use super::fts_query::convert_query;
use super::types::format_timestamp;

/// Relevance weights for the `path`, `title` and `body` columns.
const RANK: &str = "bm25(notes_fts, 1000.0, 500.0, 1.0)";
const SNIPPET: &str = "snippet(notes_fts, 2, '<mark>', '</mark>', '…', 20)";
const COLUMNS: &str =
    "n.id, n.path, n.title, n.lead, n.body, n.word_count, n.checksum, n.metadata, n.created, n.modified";

/// Options for [`Finder::find`](super::Finder::find).
#[derive(Debug, Clone, Default)]
pub struct FindOpts {
    pub filters: Vec<Filter>,
    /// The last sorter is the primary sort key.
    pub sorters: Vec<Sorter>,
    /// Maximum number of matches, `0` for no limit.
    pub limit: usize,
}

/// A restriction on the notes returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Full-text query in the user grammar of [`convert_query`].
    Match(String),
    /// Keep notes whose path matches any of these GLOB patterns, or lies below
    /// a directory that does.
    PathInclude(Vec<String>),
    /// Drop notes whose path matches any of these GLOB patterns, or lies below
    /// a directory that does.
    PathExclude(Vec<String>),
    Date { field: DateField, direction: DateDirection, value: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Created,
    Modified,
}

impl DateField {
    fn column(self) -> &'static str {
        match self {
            Self::Created => "n.created",
            Self::Modified => "n.modified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDirection {
    /// Same calendar day (UTC).
    On,
    Before,
    /// At or after the given instant.
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Created,
    Modified,
    Path,
    Title,
    WordCount,
    Random,
}

impl SortField {
    fn expr(self) -> &'static str {
        match self {
            Self::Created => "n.created",
            Self::Modified => "n.modified",
            Self::Path => "n.path",
            Self::Title => "n.title COLLATE NOCASE",
            Self::WordCount => "n.word_count",
            Self::Random => "RANDOM()",
        }
    }

    /// Direction used when none is given: alphabetical fields ascend,
    /// dates and counts descend.
    fn default_ascending(self) -> bool {
        matches!(self, Self::Path | Self::Title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorter {
    pub field: SortField,
    pub ascending: bool,
}

impl Sorter {
    pub fn new(field: SortField) -> Self {
        Self { field, ascending: field.default_ascending() }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sort term: {0}")]
pub struct ParseSorterError(String);

impl FromStr for Sorter {
    type Err = ParseSorterError;

    /// Parses `field`, `field+` or `field-`, e.g. `modified-` or `wc+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, ascending) = if let Some(name) = s.strip_suffix('+') {
            (name, Some(true))
        } else if let Some(name) = s.strip_suffix('-') {
            (name, Some(false))
        } else {
            (s, None)
        };

        let field = match name.to_ascii_lowercase().as_str() {
            "created" | "c" => SortField::Created,
            "modified" | "m" => SortField::Modified,
            "path" | "p" => SortField::Path,
            "title" | "t" => SortField::Title,
            "word-count" | "wc" => SortField::WordCount,
            "random" | "r" => SortField::Random,
            _ => return Err(ParseSorterError(s.to_string())),
        };

        Ok(Self { field, ascending: ascending.unwrap_or_else(|| field.default_ascending()) })
    }
}

/// A compiled search: SQL text plus positional parameters.
pub(crate) struct QueryPlan {
    pub sql: String,
    pub params: Vec<Box<dyn ToSql>>,
    /// The translated FTS query, when the search has a content filter.
    pub fts_query: Option<String>,
}

impl FindOpts {
    pub(crate) fn plan(&self) -> Result<QueryPlan, IndexError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        let mut fts_query: Option<String> = None;

        for filter in &self.filters {
            match filter {
                Filter::Match(text) => {
                    if fts_query.is_some() {
                        return Err(IndexError::InvalidFilter(
                            "only one content filter is allowed".to_string(),
                        ));
                    }
                    let query = convert_query(text);
                    if query.trim().is_empty() {
                        continue;
                    }
                    conditions.push("notes_fts MATCH ?".to_string());
                    params.push(Box::new(query.clone()));
                    fts_query = Some(query);
                }
                Filter::PathInclude(patterns) => {
                    if patterns.is_empty() {
                        continue;
                    }
                    let alternatives = patterns
                        .iter()
                        .map(|p| {
                            push_glob(&mut params, p);
                            "n.path GLOB ? OR n.path GLOB ?"
                        })
                        .collect::<Vec<_>>()
                        .join(" OR ");
                    conditions.push(format!("({alternatives})"));
                }
                Filter::PathExclude(patterns) => {
                    for p in patterns {
                        push_glob(&mut params, p);
                        conditions.push("NOT (n.path GLOB ? OR n.path GLOB ?)".to_string());
                    }
                }
                Filter::Date { field, direction, value } => {
                    let column = field.column();
                    match direction {
                        DateDirection::On => {
                            conditions.push(format!("date({column}) = ?"));
                            params.push(Box::new(value.date_naive().to_string()));
                        }
                        DateDirection::Before => {
                            conditions.push(format!("{column} < ?"));
                            params.push(Box::new(format_timestamp(value)));
                        }
                        DateDirection::After => {
                            conditions.push(format!("{column} >= ?"));
                            params.push(Box::new(format_timestamp(value)));
                        }
                    }
                }
            }
        }

        let mut sql = if fts_query.is_some() {
            format!(
                "SELECT {COLUMNS}, {SNIPPET} FROM notes_fts JOIN notes n ON n.id = notes_fts.rowid"
            )
        } else {
            format!("SELECT {COLUMNS}, '' FROM notes n")
        };

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let mut order: Vec<String> = self
            .sorters
            .iter()
            .rev()
            .map(|s| {
                let dir = if s.ascending { "ASC" } else { "DESC" };
                format!("{} {dir}", s.field.expr())
            })
            .collect();
        order.push(if fts_query.is_some() { RANK.to_string() } else { SortField::Title.expr().to_string() });
        order.push("n.path".to_string());

        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        if self.limit > 0 {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(self.limit as i64));
        }

        Ok(QueryPlan { sql, params, fts_query })
    }
}

/// A pattern matches the path itself or anything below it as a directory.
fn push_glob(params: &mut Vec<Box<dyn ToSql>>, pattern: &str) {
    let pattern = pattern.trim_end_matches('/');
    params.push(Box::new(pattern.to_string()));
    params.push(Box::new(format!("{pattern}/*")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("title", SortField::Title, true)]
    #[case("t-", SortField::Title, false)]
    #[case("created", SortField::Created, false)]
    #[case("c+", SortField::Created, true)]
    #[case("modified", SortField::Modified, false)]
    #[case("path", SortField::Path, true)]
    #[case("word-count+", SortField::WordCount, true)]
    #[case("wc", SortField::WordCount, false)]
    #[case("Random", SortField::Random, false)]
    fn parses_sorters(#[case] input: &str, #[case] field: SortField, #[case] ascending: bool) {
        assert_eq!(input.parse::<Sorter>().unwrap(), Sorter { field, ascending });
    }

    #[test]
    fn rejects_unknown_sorter() {
        assert_eq!("size".parse::<Sorter>(), Err(ParseSorterError("size".to_string())));
    }

    #[test]
    fn enumeration_orders_by_title() {
        let plan = FindOpts::default().plan().unwrap();

        assert!(plan.fts_query.is_none());
        assert!(plan.sql.starts_with("SELECT n.id"));
        assert!(plan.sql.ends_with("ORDER BY n.title COLLATE NOCASE, n.path"));
        assert!(plan.params.is_empty());
    }

    #[test]
    fn content_filter_ranks_and_snippets() {
        let opts = FindOpts { filters: vec![Filter::Match("hello*".into())], ..Default::default() };
        let plan = opts.plan().unwrap();

        assert_eq!(plan.fts_query.as_deref(), Some(r#""hello"*"#));
        assert!(plan.sql.contains("notes_fts MATCH ?"));
        assert!(plan.sql.contains(SNIPPET));
        assert!(plan.sql.contains(&format!("ORDER BY {RANK}, n.path")));
    }

    #[test]
    fn blank_content_filter_is_ignored() {
        let opts = FindOpts { filters: vec![Filter::Match("  ".into())], ..Default::default() };
        assert!(opts.plan().unwrap().fts_query.is_none());
    }

    #[test]
    fn at_most_one_content_filter() {
        let opts = FindOpts {
            filters: vec![Filter::Match("a".into()), Filter::Match("b".into())],
            ..Default::default()
        };
        assert!(matches!(opts.plan(), Err(IndexError::InvalidFilter(_))));
    }

    #[test]
    fn last_sorter_is_primary() {
        let opts = FindOpts {
            sorters: vec![Sorter::new(SortField::Title), Sorter::new(SortField::Modified)],
            limit: 5,
            ..Default::default()
        };
        let plan = opts.plan().unwrap();

        assert!(plan.sql.contains(
            "ORDER BY n.modified DESC, n.title COLLATE NOCASE ASC, n.title COLLATE NOCASE, n.path LIMIT ?"
        ));
        assert_eq!(plan.params.len(), 1);
    }

    #[test]
    fn filters_are_conjunctive() {
        let opts = FindOpts {
            filters: vec![
                Filter::PathInclude(vec!["journal".into(), "*.md".into()]),
                Filter::PathExclude(vec!["journal/private/".into()]),
                Filter::Date {
                    field: DateField::Created,
                    direction: DateDirection::On,
                    value: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
                },
            ],
            ..Default::default()
        };
        let plan = opts.plan().unwrap();

        assert!(plan.sql.contains(
            "WHERE (n.path GLOB ? OR n.path GLOB ? OR n.path GLOB ? OR n.path GLOB ?) \
             AND NOT (n.path GLOB ? OR n.path GLOB ?) AND date(n.created) = ?"
        ));
        assert_eq!(plan.params.len(), 7);
    }
}
