use crate::config::types::{ConfigFile, LoggingConfig, ResolvedConfig};
use shellexpand::full;
use std::path::{Path, PathBuf};
use std::{env, fs};

use dirs::home_dir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(String),

    #[error("failed to read config file {0}: {1}")]
    ReadError(String, #[source] std::io::Error),

    #[error("failed to parse TOML in {0}: {1}")]
    ParseError(String, #[source] toml::de::Error),

    #[error("version {0} is unsupported (expected 1)")]
    BadVersion(u32),

    #[error("note extension must not be empty")]
    EmptyExtension,

    #[error("home directory not available to expand '~'")]
    NoHome,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config file at `config_path`, or at [`default_config_path`].
    ///
    /// `root_override` replaces the notebook root declared in the file.
    pub fn load(
        config_path: Option<&Path>,
        root_override: Option<&Path>,
    ) -> Result<ResolvedConfig, ConfigError> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let s = fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadError(path.display().to_string(), e))?;

        let cf: ConfigFile = toml::from_str(&s)
            .map_err(|e| ConfigError::ParseError(path.display().to_string(), e))?;

        Self::resolve(cf, root_override)
    }

    /// Default settings for a notebook at `root`, for use without a config file.
    pub fn for_root(root: &Path) -> Result<ResolvedConfig, ConfigError> {
        Self::resolve(ConfigFile { version: 1, ..Default::default() }, Some(root))
    }

    fn resolve(
        cf: ConfigFile,
        root_override: Option<&Path>,
    ) -> Result<ResolvedConfig, ConfigError> {
        if cf.version != 1 {
            return Err(ConfigError::BadVersion(cf.version));
        }

        let extension = cf.notebook.extension.trim_start_matches('.').to_string();
        if extension.is_empty() {
            return Err(ConfigError::EmptyExtension);
        }

        let root = match root_override {
            Some(root) => root.to_path_buf(),
            None => expand_path(&cf.notebook.root)?,
        };
        let sub = |s: &str| s.replace("{{root}}", &root.to_string_lossy());

        let index_path = expand_path(&sub(&cf.notebook.index_path))?;

        let excluded_folders =
            cf.notebook.excluded_folders.iter().map(PathBuf::from).collect();

        let logging = if let Some(ref file) = cf.logging.file {
            LoggingConfig {
                level: cf.logging.level.clone(),
                file_level: cf.logging.file_level.clone(),
                file: Some(expand_path(&sub(&file.to_string_lossy()))?),
            }
        } else {
            cf.logging.clone()
        };

        Ok(ResolvedConfig { root, extension, index_path, excluded_folders, logging })
    }
}

pub fn default_config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("slipbox").join("config.toml");
    }
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("slipbox").join("config.toml")
}

fn expand_path(input: &str) -> Result<PathBuf, ConfigError> {
    let expanded = full(input).map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(expanded.to_string()))
}
