use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use terrain50::{GridRef, TerrainServiceBuilder};

#[derive(Serialize)]
struct HeightOutput {
    #[serde(rename = "osGridRef")]
    os_grid_ref: String,
    easting: i32,
    northing: i32,
    height: f64,
}

pub fn run(
    data_dir: Option<PathBuf>,
    archive_suffix: Option<String>,
    reference: &str,
    json: bool,
) -> Result<()> {
    let mut builder = match data_dir {
        Some(dir) => TerrainServiceBuilder::new(dir),
        None => TerrainServiceBuilder::from_env().context(
            "TERRAIN50_DATA_DIR environment variable not set. Use --data-dir or set TERRAIN50_DATA_DIR",
        )?,
    };
    if let Some(suffix) = archive_suffix {
        builder = builder.archive_suffix(&suffix);
    }
    let service = builder.build();

    let gridref: GridRef = reference
        .parse()
        .with_context(|| format!("invalid grid reference {reference:?}"))?;
    let height = service
        .height_at(&gridref)
        .with_context(|| format!("failed to resolve height at {reference}"))?;

    if json {
        let output = HeightOutput {
            os_grid_ref: gridref.format(10),
            easting: gridref.easting(),
            northing: gridref.northing(),
            height,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{height:.1}");
    }

    Ok(())
}
