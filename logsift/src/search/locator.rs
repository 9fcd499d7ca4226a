use ignore::{DirEntry, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::TraversalMode;
use crate::errors::{SearchError, SearchResult};
use crate::filters::FileFilter;

/// Lazily yields the log files under `root` that `filter` accepts.
///
/// The root is checked once, up front; nothing is listed if it is missing.
/// Entries come out sorted by file name within each directory, so repeated
/// runs over the same tree scan files in the same order. Links to files are
/// listed like the files they point at; links to directories are not
/// descended into, and `max_depth` bounds recursion.
pub fn locate(
    root: &Path,
    filter: &FileFilter,
    traversal: TraversalMode,
    max_depth: usize,
) -> SearchResult<impl Iterator<Item = PathBuf>> {
    if !root.is_dir() {
        return Err(SearchError::directory_not_found(root));
    }
    let root = root
        .canonicalize()
        .map_err(|e| SearchError::directory_read(root, e))?;

    let depth = match traversal {
        TraversalMode::Flat => 1,
        TraversalMode::Recursive => max_depth.max(1),
    };
    debug!(
        "Locating files under {} ({:?}, depth {}) with prefixes {:?}",
        root.display(),
        traversal,
        depth,
        filter.prefixes()
    );

    let mut walker = WalkBuilder::new(&root);
    walker
        .standard_filters(false)
        .follow_links(false)
        .max_depth(Some(depth))
        .sort_by_file_name(|a, b| a.cmp(b));

    let filter = filter.clone();
    Ok(walker
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                None
            }
        })
        .filter(is_regular_file)
        .filter(move |entry| filter.should_include_file(entry.path()))
        .map(|entry| entry.into_path()))
}

/// Regular files, and symbolic links that resolve to one
fn is_regular_file(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Some(ft) if ft.is_file() => true,
        Some(ft) if ft.is_symlink() => entry.path().is_file(),
        _ => false,
    }
}
