//! Tile archive download functionality.
//!
//! Only available with the `download` feature. Fetches per-tile zip archives
//! from a configurable URL template into the directory layout that
//! [`ZipTileStore`](crate::ZipTileStore) reads (`<dest>/<square>/<id><suffix>`),
//! so a downloaded tile is immediately servable.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{Result, Terrain50Error};
use crate::gridref::TileId;
use crate::store::DEFAULT_ARCHIVE_SUFFIX;

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for downloading tile archives.
///
/// The URL template supports two placeholders: `{square}` (the 100 km square,
/// e.g. `ny`) and `{id}` (the tile id, e.g. `ny21`).
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// URL template with `{square}` and `{id}` placeholders.
    pub url_template: String,
    /// Archive filename suffix to store downloads under.
    pub archive_suffix: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of retry attempts on failure.
    pub max_retries: u32,
}

impl DownloadConfig {
    /// Create a configuration from a URL template.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use terrain50::download::DownloadConfig;
    ///
    /// let config = DownloadConfig::new(
    ///     "https://example.com/terr50/{square}/{id}.zip",
    /// );
    /// ```
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            archive_suffix: DEFAULT_ARCHIVE_SUFFIX.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 3,
        }
    }

    /// Set the archive filename suffix used for stored downloads.
    pub fn with_archive_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.archive_suffix = suffix.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Tile archive downloader.
pub struct Downloader {
    client: Client,
    config: DownloadConfig,
}

impl Downloader {
    /// Create a downloader with the given configuration.
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Download the archive for a tile into `dest_dir`.
    ///
    /// Stores it at `<dest_dir>/<square>/<id><suffix>` and returns that path.
    /// An already-present archive is kept and not re-fetched.
    pub fn download_tile(&self, id: &TileId, dest_dir: &Path) -> Result<PathBuf> {
        if self.config.url_template.is_empty() {
            return Err(Terrain50Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no download URL template configured",
            )));
        }

        let url = self
            .config
            .url_template
            .replace("{square}", id.square())
            .replace("{id}", id.as_str());

        let square_dir = dest_dir.join(id.square());
        let dest_path = square_dir.join(format!("{id}{}", self.config.archive_suffix));
        if dest_path.exists() {
            return Ok(dest_path);
        }
        fs::create_dir_all(&square_dir)?;

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(500 * u64::from(attempt)));
            }
            match self.fetch(&url, &dest_path) {
                Ok(()) => return Ok(dest_path),
                Err(e) => last_error = Some(e),
            }
        }

        // The loop runs at least once, so an error is always recorded.
        Err(last_error.unwrap_or_else(|| {
            Terrain50Error::Io(std::io::Error::other("download failed"))
        }))
    }

    fn fetch(&self, url: &str, dest_path: &Path) -> Result<()> {
        let response = self.client.get(url).send()?.error_for_status()?;
        let body = response.bytes()?;

        // Write to a sibling temp file first so a partial download never
        // looks like a valid archive to the store.
        let tmp_path = dest_path.with_extension("part");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&body)?;
        file.sync_all()?;
        fs::rename(&tmp_path, dest_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::gridref::GridRef;

    #[test]
    fn test_url_template_substitution() {
        let id = GridRef::new(320_000, 510_000).unwrap().tile_id();
        let url = "https://example.com/{square}/{id}.zip"
            .replace("{square}", id.square())
            .replace("{id}", id.as_str());
        assert_eq!(url, "https://example.com/ny/ny21.zip");
    }

    #[test]
    fn test_empty_template_rejected() {
        let downloader = Downloader::new(DownloadConfig::new("")).unwrap();
        let id = GridRef::new(320_000, 510_000).unwrap().tile_id();
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(downloader.download_tile(&id, tmp.path()).is_err());
    }

    #[test]
    fn test_existing_archive_not_refetched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let id = GridRef::new(320_000, 510_000).unwrap().tile_id();
        let square_dir = tmp.path().join(id.square());
        std::fs::create_dir_all(&square_dir).unwrap();
        let existing = square_dir.join(format!("{id}{DEFAULT_ARCHIVE_SUFFIX}"));
        std::fs::write(&existing, b"archive").unwrap();

        // An unreachable template proves no request is attempted.
        let config = DownloadConfig::new("http://127.0.0.1:1/{id}.zip").with_max_retries(0);
        let downloader = Downloader::new(config).unwrap();
        let path = downloader.download_tile(&id, tmp.path()).unwrap();
        assert_eq!(path, existing);
        assert_eq!(std::fs::read(&path).unwrap(), b"archive");
    }
}
