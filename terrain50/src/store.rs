//! Backing tile storage.
//!
//! Tiles are distributed as one zip archive per 10 km cell, grouped into a
//! subdirectory per 100 km square (`data/ny/ny21<suffix>`). Each archive
//! contains exactly one qualifying `.asc` payload. The archive filename
//! suffix is a distribution detail (the national dataset stamps a release
//! date into it), so it is configuration here rather than a contract.

use std::io::Read;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::{Result, Terrain50Error};
use crate::gridref::TileId;

/// Default archive filename suffix of the OS Terrain 50 distribution.
pub const DEFAULT_ARCHIVE_SUFFIX: &str = "_OST50GRID_20200303.zip";

/// Suffix identifying the elevation payload inside an archive.
const PAYLOAD_SUFFIX: &str = ".asc";

/// A byte-stream provider keyed by tile id.
///
/// Implementations must support concurrent, independent fetches of the same
/// id: loaders racing to populate a cache entry may each open the resource,
/// and only one result is kept.
pub trait TileStore: Send + Sync {
    /// Fetch the raw payload for a tile.
    fn fetch(&self, id: &TileId) -> Result<Vec<u8>>;
}

/// Tile store reading per-cell zip archives from a local directory tree.
pub struct ZipTileStore {
    data_dir: PathBuf,
    archive_suffix: String,
}

impl ZipTileStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::with_suffix(data_dir, DEFAULT_ARCHIVE_SUFFIX)
    }

    /// Create a store with a non-default archive filename suffix.
    pub fn with_suffix<P: AsRef<Path>>(data_dir: P, archive_suffix: &str) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            archive_suffix: archive_suffix.to_string(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the archive holding a tile.
    pub fn archive_path(&self, id: &TileId) -> PathBuf {
        self.data_dir
            .join(id.square())
            .join(format!("{id}{}", self.archive_suffix))
    }
}

impl TileStore for ZipTileStore {
    fn fetch(&self, id: &TileId) -> Result<Vec<u8>> {
        let path = self.archive_path(id);
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Terrain50Error::TileNotFound { tile: id.clone() })
            }
            Err(e) => return Err(e.into()),
        };

        let mut archive = ZipArchive::new(file)
            .map_err(|e| Terrain50Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| {
                Terrain50Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;
            if entry.name().ends_with(PAYLOAD_SUFFIX) {
                let mut payload = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut payload)?;
                return Ok(payload);
            }
        }

        Err(Terrain50Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no {PAYLOAD_SUFFIX} entry in {}", path.display()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::TempDir;

    use crate::gridref::GridRef;

    fn write_archive(dir: &Path, id: &TileId, suffix: &str, entries: &[(&str, &str)]) {
        let square_dir = dir.join(id.square());
        std::fs::create_dir_all(&square_dir).unwrap();
        let file = std::fs::File::create(square_dir.join(format!("{id}{suffix}"))).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn tile_id() -> TileId {
        GridRef::new(320_000, 510_000).unwrap().tile_id()
    }

    #[test]
    fn test_fetch_reads_asc_entry() {
        let tmp = TempDir::new().unwrap();
        let id = tile_id();
        write_archive(
            tmp.path(),
            &id,
            DEFAULT_ARCHIVE_SUFFIX,
            &[("metadata.xml", "<x/>"), ("NY21.asc", "ncols 200\n")],
        );

        let store = ZipTileStore::new(tmp.path());
        let payload = store.fetch(&id).unwrap();
        assert_eq!(payload, b"ncols 200\n");
    }

    #[test]
    fn test_fetch_missing_archive() {
        let tmp = TempDir::new().unwrap();
        let store = ZipTileStore::new(tmp.path());
        assert!(matches!(
            store.fetch(&tile_id()),
            Err(Terrain50Error::TileNotFound { .. })
        ));
    }

    #[test]
    fn test_fetch_archive_without_payload() {
        let tmp = TempDir::new().unwrap();
        let id = tile_id();
        write_archive(
            tmp.path(),
            &id,
            DEFAULT_ARCHIVE_SUFFIX,
            &[("metadata.xml", "<x/>")],
        );

        let store = ZipTileStore::new(tmp.path());
        assert!(matches!(store.fetch(&id), Err(Terrain50Error::Io(_))));
    }

    #[test]
    fn test_custom_suffix() {
        let tmp = TempDir::new().unwrap();
        let id = tile_id();
        write_archive(tmp.path(), &id, ".zip", &[("ny21.asc", "data")]);

        let store = ZipTileStore::with_suffix(tmp.path(), ".zip");
        assert_eq!(store.fetch(&id).unwrap(), b"data");
        assert!(store
            .archive_path(&id)
            .ends_with(Path::new("ny").join("ny21.zip")));
    }
}
