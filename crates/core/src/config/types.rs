use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub version: u32,
    pub notebook: NotebookConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct NotebookConfig {
    /// Root directory of the slip box.
    pub root: String,
    /// Extension of note files, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Location of the SQLite index. `{{root}}` expands to the notebook root.
    #[serde(default = "default_index_path")]
    pub index_path: String,
    /// Folders to exclude from indexing (relative to root).
    #[serde(default)]
    pub excluded_folders: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            extension: default_extension(),
            index_path: default_index_path(),
            excluded_folders: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_extension() -> String {
    "md".to_string()
}

fn default_index_path() -> String {
    "{{root}}/.slipbox/index.db".to_string()
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub extension: String,
    pub index_path: PathBuf,
    /// Relative to `root`.
    pub excluded_folders: Vec<PathBuf>,
    pub logging: LoggingConfig,
}
