//! Display refresh for freshly synchronized tiles.
//!
//! A synced area directory holds one `<index>.stg` file per tile. After a
//! new area appears on disk, every tile in it is handed to a
//! [`TileRefresher`] so the display can reload it.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::error::ServiceError;
use crate::transport::local_path;

/// Extension of tile description files.
pub const TILE_FILE_EXTENSION: &str = "stg";

/// Reloads a displayed tile by its numeric index.
pub trait TileRefresher: Send {
    fn refresh_tile(&self, index: i64);
}

impl<F> TileRefresher for F
where
    F: Fn(i64) + Send,
{
    fn refresh_tile(&self, index: i64) {
        self(index)
    }
}

/// Tile index from the leading decimal digits of a file name.
///
/// `3088961.stg` gives `3088961`; names without leading digits give `None`.
pub fn tile_index(file_name: &str) -> Option<i64> {
    let digits: &str = {
        let end = file_name
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(file_name.len());
        &file_name[..end]
    };
    digits.parse().ok()
}

/// Indices of all `.stg` files directly inside `dir`, sorted.
pub fn tile_indices(dir: &Path) -> Result<Vec<i64>, ServiceError> {
    let scan_err = |source| ServiceError::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let mut indices = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        if !entry.file_type().map_err(scan_err)?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(TILE_FILE_EXTENSION) {
            continue;
        }
        if let Some(index) = path.file_name().and_then(|n| n.to_str()).and_then(tile_index) {
            indices.push(index);
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Refresh every tile of `relative_dir` below `root`.
///
/// A directory that no longer exists refreshes nothing. Returns the number
/// of tiles refreshed.
pub fn refresh_scenery(
    root: &Path,
    relative_dir: &str,
    refresher: &dyn TileRefresher,
) -> Result<usize, ServiceError> {
    let dir = local_path(root, relative_dir);
    if !dir.is_dir() {
        return Ok(0);
    }

    let indices = tile_indices(&dir)?;
    for &index in &indices {
        refresher.refresh_tile(index);
    }
    debug!(dir = relative_dir, tiles = indices.len(), "Refreshed scenery");
    Ok(indices.len())
}
