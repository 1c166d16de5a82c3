//! Load-once tile cache.
//!
//! Maps a [`TileId`] to its decoded tile, guaranteeing a single decode per
//! tile no matter how many callers race for it. Failures are cached exactly
//! like successes, so a missing or corrupt tile fails fast on every later
//! request without touching storage again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::{Result, Terrain50Error};
use crate::gridref::TileId;
use crate::tile::Tile;

/// Outcome of one tile load, shared by every caller of the same id.
type TileResult = std::result::Result<Arc<Tile>, Arc<Terrain50Error>>;

/// Unbounded, concurrency-safe map from tile id to decoded tile.
///
/// The map mutex is held only to install or retrieve a per-tile cell, never
/// across a load, so callers for unrelated tiles do not contend. The cell's
/// `OnceLock` is the per-tile completion barrier: the first caller runs the
/// loader, late arrivals block on the cell until it resolves. Entries live
/// until [`TileCache::clear`].
#[derive(Default)]
pub struct TileCache {
    entries: Mutex<HashMap<TileId, Arc<OnceLock<TileResult>>>>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tile for `id`, invoking `load` to populate it if absent.
    ///
    /// For any fixed `id`, concurrent callers observe exactly one `load`
    /// invocation; all receive the same tile or the same error, wrapped in
    /// [`Terrain50Error::DecodeFailed`].
    pub fn get_or_load<F>(&self, id: &TileId, load: F) -> Result<Arc<Tile>>
    where
        F: FnOnce() -> Result<Tile>,
    {
        let cell = {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            entries.entry(id.clone()).or_default().clone()
        };

        cell.get_or_init(|| load().map(Arc::new).map_err(Arc::new))
            .clone()
            .map_err(Terrain50Error::DecodeFailed)
    }

    /// Number of resolved or in-flight entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry by swapping in an empty map.
    ///
    /// Loads already holding a cell are unaffected; they complete into an
    /// entry that is simply no longer reachable.
    pub fn clear(&self) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *entries = HashMap::new();
    }
}
