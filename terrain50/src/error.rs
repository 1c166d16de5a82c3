//! Error types for the terrain50 library.

use std::sync::Arc;

use thiserror::Error;

use crate::gridref::TileId;

/// Errors that can occur when parsing grid references or reading tiles.
#[derive(Error, Debug)]
pub enum Terrain50Error {
    /// The reference string does not match any accepted notation.
    #[error("invalid grid reference: {reference:?}")]
    InvalidFormat { reference: String },

    /// A grid letter outside the valid national-grid lettering (`I` is never valid).
    #[error("invalid grid letter: {letter:?}")]
    InvalidGridLetter { letter: char },

    /// The easting and northing digit groups have different lengths.
    #[error("digit mismatch: easting has {easting} digits, northing has {northing}")]
    DigitMismatch { easting: usize, northing: usize },

    /// A tile header field does not match the values implied by the selecting reference.
    #[error("tile header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch { expected: String, found: String },

    /// The tile payload ended before all data rows were read.
    #[error("tile truncated after {rows} data rows")]
    ShortFile { rows: usize },

    /// A data row did not split into the expected samples, or a sample failed to parse.
    #[error("malformed tile row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// Content remained after the final data row.
    #[error("unexpected data after final tile row")]
    TrailingData,

    /// No backing archive exists for the tile.
    #[error("no tile archive for {tile}")]
    TileNotFound { tile: TileId },

    /// IO error when reading backing storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A cached terminal decode failure, shared by every caller of the same tile.
    #[error("tile decode failed: {0}")]
    DecodeFailed(#[source] Arc<Terrain50Error>),

    /// Failed to download the remote tile archive.
    #[cfg(feature = "download")]
    #[error("download error: {0}")]
    Download(#[from] reqwest::Error),
}

impl Terrain50Error {
    /// The underlying error, unwrapping a cached [`Terrain50Error::DecodeFailed`].
    pub fn root_cause(&self) -> &Terrain50Error {
        match self {
            Terrain50Error::DecodeFailed(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Result type alias using [`Terrain50Error`].
pub type Result<T> = std::result::Result<T, Terrain50Error>;
