//! Height resolution service.
//!
//! [`TerrainService`] composes the parser, store, codec and cache: it parses
//! a grid reference, derives the owning tile id and in-tile offset, loads the
//! tile through the cache (at most one decode per tile, failures cached),
//! and converts the stored fixed-point sample back to metres.
//!
//! # Example
//!
//! ```ignore
//! use terrain50::TerrainService;
//!
//! let service = TerrainService::new("/data/terr50");
//! let height = service.height("NY 21108 10343")?; // Great Gable
//! println!("{height} m");
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::TileCache;
use crate::error::Result;
use crate::gridref::GridRef;
use crate::store::{TileStore, ZipTileStore, DEFAULT_ARCHIVE_SUFFIX};
use crate::tile::{Tile, CELL_SIZE, SCALE_FACTOR, TILE_SPAN};

/// Resolution counters, shared with whoever exposes them.
///
/// Explicitly constructed and injectable so tests can assert on isolated
/// instances; not process-global state.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Height requests that reached the tile cache.
    requests: AtomicU64,
    /// Tiles actually read and decoded (first resolution of a tile only).
    decodes: AtomicU64,
    /// Decodes that ended in a cached terminal failure.
    failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            decodes: self.decodes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the [`Metrics`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub decodes: u64,
    pub failures: u64,
}

/// Elevation lookup service over a tile store.
pub struct TerrainService {
    store: Box<dyn TileStore>,
    cache: TileCache,
    metrics: Arc<Metrics>,
}

impl TerrainService {
    /// Create a service reading zip archives from `data_dir` with the
    /// standard distribution filename suffix.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::with_store(Box::new(ZipTileStore::new(data_dir)))
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> TerrainServiceBuilder {
        TerrainServiceBuilder::new(data_dir)
    }

    /// Create a service over any tile store.
    pub fn with_store(store: Box<dyn TileStore>) -> Self {
        Self {
            store,
            cache: TileCache::new(),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Height in metres at a textual grid reference.
    ///
    /// Parse failures surface unchanged; tile failures surface as the cached
    /// decode error for the tile.
    pub fn height(&self, reference: &str) -> Result<f64> {
        let gridref = GridRef::parse(reference)?;
        self.height_at(&gridref)
    }

    /// Height in metres at a parsed grid reference.
    pub fn height_at(&self, gridref: &GridRef) -> Result<f64> {
        let tile = self.load_tile(gridref)?;

        let col = ((gridref.easting() % TILE_SPAN) / CELL_SIZE) as usize;
        let row = ((gridref.northing() % TILE_SPAN) / CELL_SIZE) as usize;

        Ok(f64::from(tile.sample(row, col)) / f64::from(SCALE_FACTOR))
    }

    /// Load the tile owning a reference, through the cache.
    fn load_tile(&self, gridref: &GridRef) -> Result<Arc<Tile>> {
        self.metrics.requests.fetch_add(1, Ordering::Relaxed);

        let id = gridref.tile_id();
        self.cache.get_or_load(&id, || {
            self.metrics.decodes.fetch_add(1, Ordering::Relaxed);
            let result = self
                .store
                .fetch(&id)
                .and_then(|payload| Tile::decode(gridref, payload.as_slice()));
            if result.is_err() {
                self.metrics.failures.fetch_add(1, Ordering::Relaxed);
            }
            result
        })
    }

    /// Shared handle to the resolution counters.
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Current counter values.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Number of cached tiles (including cached failures).
    pub fn cached_tiles(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached tiles; the next request per tile re-reads storage.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Builder for [`TerrainService`].
pub struct TerrainServiceBuilder {
    data_dir: std::path::PathBuf,
    archive_suffix: String,
    metrics: Option<Arc<Metrics>>,
}

impl TerrainServiceBuilder {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            archive_suffix: DEFAULT_ARCHIVE_SUFFIX.to_string(),
            metrics: None,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TERRAIN50_DATA_DIR` | Directory containing tile archives | Required |
    /// | `TERRAIN50_ARCHIVE_SUFFIX` | Archive filename suffix | distribution default |
    ///
    /// # Errors
    ///
    /// Returns an error if `TERRAIN50_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("TERRAIN50_DATA_DIR").map_err(|_| {
            crate::error::Terrain50Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "TERRAIN50_DATA_DIR environment variable not set",
            ))
        })?;

        let mut builder = Self::new(data_dir);
        if let Ok(suffix) = std::env::var("TERRAIN50_ARCHIVE_SUFFIX") {
            builder.archive_suffix = suffix;
        }
        Ok(builder)
    }

    /// Override the archive filename suffix.
    pub fn archive_suffix(mut self, suffix: &str) -> Self {
        self.archive_suffix = suffix.to_string();
        self
    }

    /// Share a metrics instance instead of allocating a fresh one.
    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> TerrainService {
        TerrainService {
            store: Box::new(ZipTileStore::with_suffix(
                &self.data_dir,
                &self.archive_suffix,
            )),
            cache: TileCache::new(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }
}
