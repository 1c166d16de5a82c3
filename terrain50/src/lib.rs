//! OS Terrain 50 elevation lookup for Great Britain.
//!
//! This crate parses Ordnance Survey national grid references, reads the
//! freely distributed OS Terrain 50 tile archives (one ESRI ASCII grid per
//! 10 km cell, 200 × 200 samples at 50 m spacing), and resolves heights
//! through a concurrency-safe load-once tile cache. It also converts between
//! grid references and latitude/longitude on the OSGB36 and WGS84 datums.
//!
//! # Quick start
//!
//! ```ignore
//! use terrain50::TerrainService;
//!
//! let service = TerrainService::new("/data/terr50");
//!
//! // Scafell Pike
//! let height = service.height("NY 21540 07216")?;
//! println!("{height} m");
//! # Ok::<(), terrain50::Terrain50Error>(())
//! ```
//!
//! # Layout on disk
//!
//! Tiles are expected in the distribution's layout: one zip archive per
//! 10 km cell, grouped by 100 km square (`data/ny/ny21_OST50GRID_20200303.zip`),
//! each containing a single `.asc` payload. The archive filename suffix is
//! configurable via [`TerrainServiceBuilder`].
//!
//! # Concurrency
//!
//! [`TerrainService`] is `Send + Sync`; share one instance behind an `Arc`.
//! Any number of threads may resolve heights concurrently, and each tile is
//! read and decoded at most once, no matter how many requests race for it.
//! Failed tiles are cached too, so a missing archive does not hammer the
//! filesystem.
//!
//! # Features
//!
//! - `download`: fetch tile archives over HTTP (pulls in `reqwest`).

pub mod cache;
#[cfg(feature = "download")]
pub mod download;
pub mod error;
pub mod geodesy;
pub mod gridref;
pub mod service;
pub mod store;
pub mod tile;

pub use cache::TileCache;
#[cfg(feature = "download")]
pub use download::{DownloadConfig, Downloader};
pub use error::{Result, Terrain50Error};
pub use geodesy::{LatLon, AIRY_1830, OSGB36_TO_WGS84, WGS84};
pub use gridref::{GridRef, TileId};
pub use service::{Metrics, MetricsSnapshot, TerrainService, TerrainServiceBuilder};
pub use store::{TileStore, ZipTileStore, DEFAULT_ARCHIVE_SUFFIX};
pub use tile::{Tile, CELL_SIZE, GRID_SIZE, SCALE_FACTOR, TILE_SPAN};
