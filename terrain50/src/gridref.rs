//! OS national-grid reference parsing and formatting.
//!
//! A grid reference combines two letters selecting a 100 km square with a
//! numeric easting/northing offset inside it. This module converts the
//! textual notations into a canonical metre-based [`GridRef`] and back, and
//! derives the [`TileId`] of the 10 km tile that owns a reference.
//!
//! # Accepted notations
//!
//! - Compact: `SE095255` (letters plus an even run of digits, split evenly)
//! - Spaced: `TG 51409 13177` (letters plus two equal-length digit groups)
//! - Numeric: `651409, 313177` (easting and northing in metres)
//!
//! Digit groups shorter than 5 digits describe a coarser cell; the reference
//! snaps to the southwest corner of that cell.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, Terrain50Error};

/// Eastward extent of the national grid in metres.
pub const GRID_EXTENT_EAST: i32 = 700_000;

/// Northward extent of the national grid in metres.
pub const GRID_EXTENT_NORTH: i32 = 1_300_000;

/// Side length of a 500 km lettered square in metres.
const LARGE_SQUARE: i32 = 500_000;

/// Side length of a 100 km lettered square in metres.
const SMALL_SQUARE: i32 = 100_000;

/// A canonical national-grid coordinate in metres.
///
/// # Example
///
/// ```
/// use terrain50::GridRef;
///
/// let gr: GridRef = "SE095255".parse().unwrap();
/// assert_eq!(gr.easting(), 409_500);
/// assert_eq!(gr.northing(), 425_500);
/// assert_eq!(gr.tile_id().as_str(), "se02");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRef {
    easting: i32,
    northing: i32,
}

/// Identifier of one 10 km × 10 km tile, e.g. `ny21`.
///
/// Two letters name the 100 km square; the digit pair names the 10 km cell
/// within it (easting digit first). All references inside the same 10 km cell
/// share a `TileId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileId(String);

impl TileId {
    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 100 km square letters, used as the archive subdirectory name.
    pub fn square(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl GridRef {
    /// Create a grid reference from metre coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Terrain50Error::InvalidFormat`] if the point lies outside
    /// the grid extent or outside the lettered 500 km squares the grid
    /// covers.
    pub fn new(easting: i32, northing: i32) -> Result<Self> {
        if !(0..GRID_EXTENT_EAST).contains(&easting)
            || !(0..GRID_EXTENT_NORTH).contains(&northing)
        {
            return Err(Terrain50Error::InvalidFormat {
                reference: format!("{easting}, {northing}"),
            });
        }
        if first_letter(easting, northing).is_none() {
            return Err(Terrain50Error::InvalidFormat {
                reference: format!("{easting}, {northing}"),
            });
        }
        Ok(Self { easting, northing })
    }

    /// Easting in metres.
    pub fn easting(&self) -> i32 {
        self.easting
    }

    /// Northing in metres.
    pub fn northing(&self) -> i32 {
        self.northing
    }

    /// Parse a textual grid reference in any accepted notation.
    ///
    /// # Errors
    ///
    /// - [`Terrain50Error::InvalidFormat`] for token shapes that match no
    ///   notation
    /// - [`Terrain50Error::InvalidGridLetter`] for letters outside the grid
    ///   lettering (`I` is always invalid)
    /// - [`Terrain50Error::DigitMismatch`] when the easting and northing
    ///   digit groups differ in length
    pub fn parse(reference: &str) -> Result<Self> {
        let s = reference.trim();
        let invalid = || Terrain50Error::InvalidFormat {
            reference: reference.to_string(),
        };

        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {
                let first = c.to_ascii_uppercase();
                let second = match chars.next() {
                    Some(c) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
                    _ => return Err(invalid()),
                };

                let (large_e, large_n) = large_square_origin(first)
                    .ok_or(Terrain50Error::InvalidGridLetter { letter: first })?;
                let (small_e, small_n) = small_square_offset(second)
                    .ok_or(Terrain50Error::InvalidGridLetter { letter: second })?;

                // Both letters are ASCII, so byte offset 2 is a char boundary.
                let (east_digits, north_digits) = split_digit_groups(&s[2..], invalid)?;
                let easting = large_e + small_e + scale_digits(east_digits, invalid)?;
                let northing = large_n + small_n + scale_digits(north_digits, invalid)?;

                Self::new(easting, northing)
            }
            Some(c) if c.is_ascii_digit() => {
                let mut parts = s.split(',');
                let easting = parts.next().ok_or_else(invalid)?;
                let northing = parts.next().ok_or_else(invalid)?;
                if parts.next().is_some() {
                    return Err(invalid());
                }
                Self::new(parse_metres(easting, invalid)?, parse_metres(northing, invalid)?)
            }
            _ => Err(invalid()),
        }
    }

    /// Format with spaces, e.g. `format(8)` yields `"SE 0950 2550"`.
    ///
    /// `digits` is the total digit count (2..=10, even), split across the
    /// easting and northing groups.
    pub fn format(&self, digits: usize) -> String {
        let (first, second) = self.square_letters();
        let (east, north) = self.offset_digits(digits / 2);
        format!("{first}{second} {east} {north}")
    }

    /// Format without separators, e.g. `format_compact(10)` yields
    /// `"SE0950025500"` — the canonical form that [`GridRef::parse`] inverts.
    pub fn format_compact(&self, digits: usize) -> String {
        let (first, second) = self.square_letters();
        let (east, north) = self.offset_digits(digits / 2);
        format!("{first}{second}{east}{north}")
    }

    /// The identifier of the 10 km tile containing this reference.
    pub fn tile_id(&self) -> TileId {
        TileId(self.format_compact(2).to_lowercase())
    }

    fn square_letters(&self) -> (char, char) {
        // new() guarantees the point is representable.
        let first = first_letter(self.easting, self.northing).unwrap_or('S');
        let col = (self.easting / SMALL_SQUARE) % 5;
        let row = (self.northing / SMALL_SQUARE) % 5;
        let index = (4 - row) * 5 + col;
        let mut letter = b'A' + index as u8;
        if letter >= b'I' {
            letter += 1;
        }
        (first, letter as char)
    }

    fn offset_digits(&self, per_axis: usize) -> (String, String) {
        let east = format!("{:05}", self.easting % SMALL_SQUARE);
        let north = format!("{:05}", self.northing % SMALL_SQUARE);
        (east[..per_axis].to_string(), north[..per_axis].to_string())
    }
}

impl FromStr for GridRef {
    type Err = Terrain50Error;

    fn from_str(s: &str) -> Result<Self> {
        GridRef::parse(s)
    }
}

impl fmt::Display for GridRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(10))
    }
}

/// Origin of the 500 km square selected by the first grid letter.
fn large_square_origin(letter: char) -> Option<(i32, i32)> {
    match letter {
        'H' => Some((0, 2 * LARGE_SQUARE)),
        'N' => Some((0, LARGE_SQUARE)),
        'O' => Some((LARGE_SQUARE, LARGE_SQUARE)),
        'S' => Some((0, 0)),
        'T' => Some((LARGE_SQUARE, 0)),
        _ => None,
    }
}

/// Offset of the 100 km square selected by the second grid letter.
///
/// Letters run A..Z left-to-right, top-to-bottom within the 500 km square,
/// skipping `I`.
fn small_square_offset(letter: char) -> Option<(i32, i32)> {
    if !letter.is_ascii_uppercase() || letter == 'I' {
        return None;
    }
    let mut index = (letter as u8 - b'A') as i32;
    if letter > 'I' {
        index -= 1;
    }
    Some(((index % 5) * SMALL_SQUARE, (4 - index / 5) * SMALL_SQUARE))
}

/// First grid letter for a point, if it falls in a covered 500 km square.
fn first_letter(easting: i32, northing: i32) -> Option<char> {
    match (easting / LARGE_SQUARE, northing / LARGE_SQUARE) {
        (0, 0) => Some('S'),
        (1, 0) => Some('T'),
        (0, 1) => Some('N'),
        (1, 1) => Some('O'),
        (0, 2) => Some('H'),
        _ => None,
    }
}

/// Split the post-letter remainder into easting and northing digit groups.
fn split_digit_groups<'a>(
    rest: &'a str,
    invalid: impl Fn() -> Terrain50Error,
) -> Result<(&'a str, &'a str)> {
    let groups: Vec<&str> = rest
        .split([' ', ',', '\t'])
        .filter(|g| !g.is_empty())
        .collect();

    match groups.as_slice() {
        [run] => {
            if run.is_empty() || !run.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            if run.len() % 2 != 0 {
                return Err(Terrain50Error::DigitMismatch {
                    easting: run.len() - run.len() / 2,
                    northing: run.len() / 2,
                });
            }
            Ok(run.split_at(run.len() / 2))
        }
        [east, north] => {
            if !east.bytes().all(|b| b.is_ascii_digit())
                || !north.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(invalid());
            }
            if east.len() != north.len() {
                return Err(Terrain50Error::DigitMismatch {
                    easting: east.len(),
                    northing: north.len(),
                });
            }
            Ok((east, north))
        }
        _ => Err(invalid()),
    }
}

/// Scale a 1..=5 digit group to metres; shorter groups snap to the southwest
/// corner of the coarser cell they describe.
fn scale_digits(digits: &str, invalid: impl Fn() -> Terrain50Error) -> Result<i32> {
    if digits.is_empty() || digits.len() > 5 {
        return Err(invalid());
    }
    let value: i32 = digits.parse().map_err(|_| invalid())?;
    Ok(value * 10_i32.pow(5 - digits.len() as u32))
}

/// Parse one half of a numeric `easting, northing` pair.
fn parse_metres(token: &str, invalid: impl Fn() -> Terrain50Error) -> Result<i32> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    token.parse().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_pair() {
        let gr = GridRef::parse("651409, 313177").unwrap();
        assert_eq!(gr.easting(), 651_409);
        assert_eq!(gr.northing(), 313_177);
    }

    #[test]
    fn test_parse_spaced_groups() {
        let gr = GridRef::parse("TG 51409 13177").unwrap();
        assert_eq!(gr.easting(), 651_409);
        assert_eq!(gr.northing(), 313_177);

        let gr = GridRef::parse("SU 0 0").unwrap();
        assert_eq!(gr.easting(), 400_000);
        assert_eq!(gr.northing(), 100_000);
    }

    #[test]
    fn test_parse_compact_run() {
        let gr = GridRef::parse("SE095255").unwrap();
        assert_eq!(gr.easting(), 409_500);
        assert_eq!(gr.northing(), 425_500);

        let gr = GridRef::parse("SE0849025580").unwrap();
        assert_eq!(gr.easting(), 408_490);
        assert_eq!(gr.northing(), 425_580);
    }

    #[test]
    fn test_letter_i_always_rejected() {
        assert!(matches!(
            GridRef::parse("SI095255"),
            Err(Terrain50Error::InvalidGridLetter { letter: 'I' })
        ));
        assert!(matches!(
            GridRef::parse("IA095255"),
            Err(Terrain50Error::InvalidGridLetter { letter: 'I' })
        ));
    }

    #[test]
    fn test_invalid_letters() {
        assert!(matches!(
            GridRef::parse("ZZ095255"),
            Err(Terrain50Error::InvalidGridLetter { letter: 'Z' })
        ));
        assert!(matches!(
            GridRef::parse("AB095255"),
            Err(Terrain50Error::InvalidGridLetter { letter: 'A' })
        ));
    }

    #[test]
    fn test_invalid_shapes() {
        for bad in ["", "NY", "S095255", "SJ95X255", "NY123X456", "12,34,56"] {
            assert!(
                matches!(
                    GridRef::parse(bad),
                    Err(Terrain50Error::InvalidFormat { .. })
                ),
                "expected InvalidFormat for {bad:?}"
            );
        }
    }

    #[test]
    fn test_odd_digit_run_is_digit_mismatch() {
        assert!(matches!(
            GridRef::parse("SJ95255"),
            Err(Terrain50Error::DigitMismatch {
                easting: 3,
                northing: 2
            })
        ));
        assert!(matches!(
            GridRef::parse("TG 514 13"),
            Err(Terrain50Error::DigitMismatch {
                easting: 3,
                northing: 2
            })
        ));
    }

    #[test]
    fn test_numeric_pair_out_of_extent() {
        assert!(GridRef::parse("700000, 0").is_err());
        assert!(GridRef::parse("0, 1300000").is_err());
        assert!(GridRef::parse("650000, 1250000").is_err()); // outside the lettered squares
    }

    #[test]
    fn test_format_round_trip() {
        let refs = [
            GridRef::new(409_500, 425_500).unwrap(),
            GridRef::new(651_409, 313_177).unwrap(),
            GridRef::new(0, 0).unwrap(),
            GridRef::new(320_000, 510_000).unwrap(),
            GridRef::new(123_456, 1_234_567).unwrap(),
        ];
        for gr in refs {
            let compact = gr.format_compact(10);
            assert_eq!(GridRef::parse(&compact).unwrap(), gr, "via {compact}");
        }
    }

    #[test]
    fn test_truncation_snaps_southwest() {
        let full = GridRef::new(408_495, 425_583).unwrap();
        // 3 digits per axis: 100 m cell
        let coarse = GridRef::parse(&full.format_compact(6)).unwrap();
        assert_eq!(coarse.easting(), 408_400);
        assert_eq!(coarse.northing(), 425_500);
        // 1 digit per axis: 10 km cell
        let coarser = GridRef::parse(&full.format_compact(2)).unwrap();
        assert_eq!(coarser.easting(), 400_000);
        assert_eq!(coarser.northing(), 420_000);
    }

    #[test]
    fn test_format_spaced() {
        let gr = GridRef::new(409_500, 425_500).unwrap();
        assert_eq!(gr.format(10), "SE 09500 25500");
        assert_eq!(gr.format(8), "SE 0950 2550");
    }

    #[test]
    fn test_square_letters_skip_i() {
        // NY: 100 km square at column 3, row 4 of the N square
        let gr = GridRef::new(320_000, 510_000).unwrap();
        assert_eq!(gr.format_compact(2), "NY21");

        // TG: second letter past I in the ordering
        let gr = GridRef::new(651_409, 313_177).unwrap();
        assert_eq!(&gr.format_compact(2)[..2], "TG");
    }

    #[test]
    fn test_tile_id() {
        let gr = GridRef::new(320_000, 510_000).unwrap();
        let id = gr.tile_id();
        assert_eq!(id.as_str(), "ny21");
        assert_eq!(id.square(), "ny");

        // Same 10 km cell, same tile id
        let other = GridRef::new(329_999, 519_999).unwrap();
        assert_eq!(other.tile_id(), id);

        // Neighbouring cell differs
        let neighbour = GridRef::new(330_000, 510_000).unwrap();
        assert_ne!(neighbour.tile_id(), id);
    }
}
