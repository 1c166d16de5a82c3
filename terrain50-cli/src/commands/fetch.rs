use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use terrain50::download::{DownloadConfig, Downloader};
use terrain50::GridRef;

pub fn run(
    data_dir: Option<PathBuf>,
    archive_suffix: Option<String>,
    references: &[String],
    url_template: &str,
) -> Result<()> {
    if references.is_empty() {
        bail!("no grid references given");
    }
    let data_dir = data_dir.context(
        "TERRAIN50_DATA_DIR environment variable not set. Use --data-dir or set TERRAIN50_DATA_DIR",
    )?;

    let mut config = DownloadConfig::new(url_template);
    if let Some(suffix) = archive_suffix {
        config = config.with_archive_suffix(suffix);
    }
    let downloader = Downloader::new(config)?;

    for reference in references {
        let gridref: GridRef = reference
            .parse()
            .with_context(|| format!("invalid grid reference {reference:?}"))?;
        let id = gridref.tile_id();
        let path = downloader
            .download_tile(&id, &data_dir)
            .with_context(|| format!("failed to fetch tile {id}"))?;
        println!("{id}: {}", path.display());
    }

    Ok(())
}
