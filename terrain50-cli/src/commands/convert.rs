use anyhow::{bail, Context, Result};
use serde::Serialize;
use terrain50::{GridRef, LatLon};

#[derive(Serialize)]
struct ConvertOutput {
    #[serde(rename = "osGridRef")]
    os_grid_ref: String,
    easting: i32,
    northing: i32,
    lat: f64,
    lon: f64,
    datum: &'static str,
}

pub fn run(
    reference: Option<&str>,
    lat: Option<f64>,
    lon: Option<f64>,
    osgb36: bool,
    json: bool,
) -> Result<()> {
    let (gridref, point) = match (reference, lat, lon) {
        (Some(reference), _, _) => {
            let gridref: GridRef = reference
                .parse()
                .with_context(|| format!("invalid grid reference {reference:?}"))?;
            let point = if osgb36 {
                gridref.to_lat_lon_osgb36()
            } else {
                gridref.to_lat_lon()
            };
            (gridref, point)
        }
        (None, Some(lat), Some(lon)) => {
            if osgb36 {
                bail!("--osgb36 conversion is only supported from a grid reference");
            }
            let point = LatLon::new(lat, lon);
            let gridref = GridRef::from_lat_lon(point)
                .context("position is outside the national grid")?;
            (gridref, point)
        }
        _ => bail!("provide either a grid reference or --lat and --lon"),
    };

    if json {
        let output = ConvertOutput {
            os_grid_ref: gridref.format(10),
            easting: gridref.easting(),
            northing: gridref.northing(),
            lat: point.lat,
            lon: point.lon,
            datum: if osgb36 { "OSGB36" } else { "WGS84" },
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if reference.is_some() {
        println!("{point}");
    } else {
        println!("{}", gridref.format(10));
    }

    Ok(())
}
