use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

/// OS Terrain 50 elevation CLI tool
#[derive(Parser)]
#[command(name = "terrain50")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing tile archives
    #[arg(short, long, env = "TERRAIN50_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Archive filename suffix
    #[arg(long, env = "TERRAIN50_ARCHIVE_SUFFIX", global = true)]
    archive_suffix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the height at a national grid reference
    Height {
        /// Grid reference (e.g. "NY 21540 07216" or "NY2107")
        gridref: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Convert between grid references and latitude/longitude
    Convert {
        /// Grid reference to convert to latitude/longitude
        gridref: Option<String>,

        /// Latitude to convert to a grid reference (requires --lon)
        #[arg(long, requires = "lon", conflicts_with = "gridref")]
        lat: Option<f64>,

        /// Longitude to convert to a grid reference (requires --lat)
        #[arg(long, requires = "lat", conflicts_with = "gridref")]
        lon: Option<f64>,

        /// Use the OSGB36 datum instead of WGS84
        #[arg(long)]
        osgb36: bool,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Download tile archives into the data directory
    Fetch {
        /// Grid references selecting the tiles to fetch
        gridrefs: Vec<String>,

        /// URL template with {square} and {id} placeholders
        #[arg(long, env = "TERRAIN50_DOWNLOAD_URL")]
        url: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Height { gridref, json } => {
            commands::height::run(cli.data_dir, cli.archive_suffix, &gridref, json)
        }
        Commands::Convert {
            gridref,
            lat,
            lon,
            osgb36,
            json,
        } => commands::convert::run(gridref.as_deref(), lat, lon, osgb36, json),
        Commands::Fetch { gridrefs, url } => {
            commands::fetch::run(cli.data_dir, cli.archive_suffix, &gridrefs, &url)
        }
    }
}
