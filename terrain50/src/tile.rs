//! Elevation tile decoding.
//!
//! A tile is an ESRI ASCII-grid payload covering one 10 km × 10 km cell:
//! a five-line header followed by 200 rows of 200 space-separated decimal
//! samples, northernmost row first. [`Tile::decode`] validates the header
//! against the reference that selected the tile, flips the rows so row 0 is
//! the southernmost, and stores each sample as a fixed-point integer
//! (metres × 10) so one decimal digit survives without floating storage.

use std::io::BufRead;

use crate::error::{Result, Terrain50Error};
use crate::gridref::GridRef;

/// Samples per tile row and column.
pub const GRID_SIZE: usize = 200;

/// Sample spacing in metres.
pub const CELL_SIZE: i32 = 50;

/// Tile side length in metres.
pub const TILE_SPAN: i32 = 10_000;

/// Fixed-point scale: stored sample = metres × `SCALE_FACTOR`.
pub const SCALE_FACTOR: i32 = 10;

/// A decoded 200×200 fixed-point elevation matrix.
///
/// Row 0 is the southernmost row; column 0 the westernmost. Immutable once
/// constructed and safe to share between threads.
#[derive(Debug)]
pub struct Tile {
    /// Row-major samples, south to north.
    samples: Box<[i16]>,
}

impl Tile {
    /// Decode a tile payload, validating it against the selecting reference.
    ///
    /// The header must literally match the five expected lines (`ncols 200`,
    /// `nrows 200`, `xllcorner`/`yllcorner` at the reference's 10 km cell
    /// origin, `cellsize 50`).
    ///
    /// # Errors
    ///
    /// - [`Terrain50Error::HeaderMismatch`] if any header line differs
    /// - [`Terrain50Error::ShortFile`] if fewer than 200 data rows follow
    /// - [`Terrain50Error::MalformedRow`] if a row has the wrong sample count
    ///   or a sample is not a decimal number
    /// - [`Terrain50Error::TrailingData`] if content follows the final row
    pub fn decode<R: BufRead>(gridref: &GridRef, reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        let expected_header = [
            format!("ncols {GRID_SIZE}"),
            format!("nrows {GRID_SIZE}"),
            format!("xllcorner {}", trunc_10k(gridref.easting())),
            format!("yllcorner {}", trunc_10k(gridref.northing())),
            format!("cellsize {CELL_SIZE}"),
        ];
        for expected in &expected_header {
            let found = match lines.next() {
                Some(line) => line?,
                None => {
                    return Err(Terrain50Error::HeaderMismatch {
                        expected: expected.clone(),
                        found: "end of file".to_string(),
                    })
                }
            };
            let found = found.trim_end_matches('\r');
            if found != expected {
                return Err(Terrain50Error::HeaderMismatch {
                    expected: expected.clone(),
                    found: found.to_string(),
                });
            }
        }

        let mut samples = vec![0i16; GRID_SIZE * GRID_SIZE];
        for row in 0..GRID_SIZE {
            let line = match lines.next() {
                Some(line) => line?,
                None => return Err(Terrain50Error::ShortFile { rows: row }),
            };

            let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
            if tokens.len() != GRID_SIZE {
                return Err(Terrain50Error::MalformedRow {
                    row,
                    reason: format!("{} samples, expected {GRID_SIZE}", tokens.len()),
                });
            }

            // Source row 0 is the northernmost; matrix row 0 the southernmost.
            let target = GRID_SIZE - 1 - row;
            for (col, token) in tokens.iter().enumerate() {
                let value: f64 = token.parse().map_err(|_| Terrain50Error::MalformedRow {
                    row,
                    reason: format!("invalid sample {token:?}"),
                })?;
                samples[target * GRID_SIZE + col] = (value * SCALE_FACTOR as f64) as i16;
            }
        }

        if lines.next().is_some() {
            return Err(Terrain50Error::TrailingData);
        }

        Ok(Self {
            samples: samples.into_boxed_slice(),
        })
    }

    /// The fixed-point sample at `[row][col]` (row 0 southernmost).
    ///
    /// Indices are clamped to the grid; valid references always produce
    /// in-range offsets.
    pub fn sample(&self, row: usize, col: usize) -> i16 {
        let row = row.min(GRID_SIZE - 1);
        let col = col.min(GRID_SIZE - 1);
        self.samples[row * GRID_SIZE + col]
    }
}

/// Truncate a metre coordinate down to its 10 km cell origin.
pub(crate) fn trunc_10k(n: i32) -> i32 {
    (n / TILE_SPAN) * TILE_SPAN
}
