//! Frontmatter types and data structures.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Represents parsed YAML frontmatter from a markdown document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Fields as key-value pairs.
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl Frontmatter {
    /// Look up a field, ignoring ASCII case of the key.
    pub fn get_ignore_case(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).or_else(|| {
            self.fields.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
        })
    }

    /// Declared `title`, if it is a non-blank string.
    pub fn title(&self) -> Option<&str> {
        self.get_ignore_case("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Fields converted to JSON values, sorted by key.
    ///
    /// Values YAML can express but JSON cannot (e.g. non-string map keys) are dropped.
    pub fn to_json(&self) -> BTreeMap<String, serde_json::Value> {
        self.fields
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// Result of splitting frontmatter from markdown.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Parsed frontmatter (if present).
    pub frontmatter: Option<Frontmatter>,
    /// The markdown body (everything after frontmatter).
    pub body: String,
}
