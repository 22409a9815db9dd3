mod cmd;
mod logging;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use slipbox_core::config::loader::default_config_path;
use slipbox_core::config::{ConfigError, ConfigLoader, ResolvedConfig};
use slipbox_core::index::Sorter;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "sb", version, about = "Incremental indexing and full-text search for a slip box")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/slipbox/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Notebook root, overriding the one in the config file
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bring the index up to date with the notes on disk
    Index(IndexArgs),

    /// Search indexed notes
    Search(SearchArgs),
}

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Print every change as it is applied
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Full-text query: words, "phrases", -excluded, a|b, prefix*, title:word
    pub query: Vec<String>,

    /// Only notes matching these path globs
    #[arg(short, long)]
    pub include: Vec<String>,

    /// Skip notes matching these path globs
    #[arg(short = 'x', long)]
    pub exclude: Vec<String>,

    /// Sort terms, the last one given is applied first (e.g. modified-, title)
    #[arg(short, long)]
    pub sort: Vec<Sorter>,

    /// Notes created on this day (YYYY-MM-DD)
    #[arg(long)]
    pub created: Option<NaiveDate>,

    #[arg(long)]
    pub created_before: Option<NaiveDate>,

    #[arg(long)]
    pub created_after: Option<NaiveDate>,

    /// Notes modified on this day (YYYY-MM-DD)
    #[arg(long)]
    pub modified: Option<NaiveDate>,

    #[arg(long)]
    pub modified_before: Option<NaiveDate>,

    #[arg(long)]
    pub modified_after: Option<NaiveDate>,

    /// Maximum number of results, 0 for all
    #[arg(short = 'n', long, default_value_t = 0)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn main() {
    let cli = Cli::parse();

    let rc = match load_config(cli.config.as_deref(), cli.root.as_deref()) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(&rc);

    match cli.command {
        Commands::Index(args) => cmd::index::run(&rc, args.verbose),
        Commands::Search(args) => cmd::search::run(&rc, args),
    }
}

/// A bare `--root` works without any config file.
fn load_config(
    config: Option<&Path>,
    root: Option<&Path>,
) -> Result<ResolvedConfig, ConfigError> {
    match (config, root) {
        (None, Some(root)) if !default_config_path().exists() => ConfigLoader::for_root(root),
        _ => ConfigLoader::load(config, root),
    }
}
