//! Index command implementation.

use slipbox_core::config::ResolvedConfig;
use slipbox_core::index::{
    BuilderError, Change, IndexBuilder, IndexDb, IndexStats, ProgressCallback,
};
use slipbox_core::vault::VaultWalker;

/// Run the index command.
pub fn run(rc: &ResolvedConfig, verbose: bool) {
    if let Some(index_dir) = rc.index_path.parent() {
        if let Err(e) = std::fs::create_dir_all(index_dir) {
            eprintln!("Error creating index directory: {}", e);
            std::process::exit(1);
        }
    }

    println!("Indexing notebook: {}", rc.root.display());

    let progress: Option<ProgressCallback> = if verbose {
        Some(Box::new(|current: usize, change: &Change| {
            println!("[{}] {}", current, change);
        }))
    } else {
        None
    };

    match index(rc, progress) {
        Ok(stats) => {
            println!();
            println!("Indexing complete:");
            println!("  Added:        {}", stats.added);
            println!("  Modified:     {}", stats.modified);
            println!("  Removed:      {}", stats.removed);
            if stats.skipped > 0 {
                println!("  Skipped:      {}", stats.skipped);
            }
            println!("  Links found:  {}", stats.links_found);
            println!("  Duration:     {}ms", stats.duration_ms);
            println!();
            println!("Index stored at: {}", rc.index_path.display());
        }
        Err(e) => {
            eprintln!("Error during indexing: {}", e);
            std::process::exit(1);
        }
    }
}

fn index(
    rc: &ResolvedConfig,
    progress: Option<ProgressCallback>,
) -> Result<IndexStats, BuilderError> {
    let walker =
        VaultWalker::with_exclusions(&rc.root, &rc.extension, rc.excluded_folders.clone())?;
    tracing::debug!("opening index at {}", rc.index_path.display());
    let mut db = IndexDb::open(&rc.index_path)?;

    IndexBuilder::new(&mut db, &walker).run(progress)
}
