//! Datum conversions between the national grid and latitude/longitude.
//!
//! The national grid is a transverse Mercator projection of the Airy 1830
//! ellipsoid (OSGB36 datum). Inverse and forward projections use the series
//! from the OS guide to coordinate systems, as popularised by Chris Veness'
//! geodesy scripts; the OSGB36 ↔ WGS84 datum shift is a seven-parameter
//! Helmert transformation through geocentric cartesian coordinates, accurate
//! to a few metres on the ground.

use crate::error::Result;
use crate::gridref::GridRef;

/// A geodetic position in decimal degrees. The datum is contextual: methods
/// producing one say which datum it is in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: wrap90(lat),
            lon: wrap180(lon),
        }
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Reference ellipsoid, by semi-major and semi-minor axes in metres.
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    pub a: f64,
    pub b: f64,
}

/// Airy 1830, the OSGB36 ellipsoid.
pub const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};

/// WGS84 (GRS80 axes).
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    b: 6_356_752.314_245,
};

impl Ellipsoid {
    /// First eccentricity squared, e² = (a² − b²) / a².
    fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }

    /// Second eccentricity squared, ε² = (a² − b²) / b².
    fn second_e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.b * self.b)
    }
}

/// Geocentric cartesian position in metres.
#[derive(Debug, Clone, Copy)]
struct Cartesian {
    x: f64,
    y: f64,
    z: f64,
}

impl Cartesian {
    /// Cartesian position of a surface point (height 0) on an ellipsoid.
    fn from_geodetic(point: LatLon, ellipsoid: Ellipsoid) -> Self {
        let (sin_lat, cos_lat) = point.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = point.lon.to_radians().sin_cos();
        let e2 = ellipsoid.e2();

        // Transverse radius of curvature at this latitude.
        let nu = ellipsoid.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

        Self {
            x: nu * cos_lat * cos_lon,
            y: nu * cos_lat * sin_lon,
            z: nu * (1.0 - e2) * sin_lat,
        }
    }

    /// Geodetic position of a cartesian point, by Bowring's closed formula.
    fn to_geodetic(self, ellipsoid: Ellipsoid) -> LatLon {
        let Ellipsoid { a, b } = ellipsoid;
        let e2 = ellipsoid.e2();
        let eps2 = ellipsoid.second_e2();

        let p = (self.x * self.x + self.y * self.y).sqrt();
        let (sin_beta, cos_beta) = (self.z * a).atan2(p * b).sin_cos();

        let lat = (self.z + eps2 * b * sin_beta.powi(3)).atan2(p - e2 * a * cos_beta.powi(3));
        let lon = self.y.atan2(self.x);

        LatLon {
            lat: lat.to_degrees(),
            lon: lon.to_degrees(),
        }
    }
}

/// Seven-parameter Helmert transformation between datums.
///
/// Translations in metres, scale in parts per million, rotations in
/// arcseconds. The transformation is linearised in the rotations, so its
/// [`inverse`](Self::inverse) is the parameter-wise negation.
#[derive(Debug, Clone, Copy)]
pub struct Helmert {
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub s: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

/// OSGB36 → WGS84 datum shift.
pub const OSGB36_TO_WGS84: Helmert = Helmert {
    tx: 446.448,
    ty: -125.157,
    tz: 542.060,
    s: -20.4894,
    rx: 0.1502,
    ry: 0.2470,
    rz: 0.8421,
};

impl Helmert {
    pub fn inverse(&self) -> Self {
        Self {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            s: -self.s,
            rx: -self.rx,
            ry: -self.ry,
            rz: -self.rz,
        }
    }

    fn apply(&self, c: Cartesian) -> Cartesian {
        let s1 = 1.0 + self.s / 1e6;
        let rx = (self.rx / 3600.0).to_radians();
        let ry = (self.ry / 3600.0).to_radians();
        let rz = (self.rz / 3600.0).to_radians();

        Cartesian {
            x: self.tx + c.x * s1 - c.y * rz + c.z * ry,
            y: self.ty + c.x * rz + c.y * s1 - c.z * rx,
            z: self.tz - c.x * ry + c.y * rx + c.z * s1,
        }
    }
}

// National grid projection constants: central meridian scale, true origin
// (49°N 2°W) and its false offsets.
const SCALE_0: f64 = 0.999_601_271_7;
const LAT_0: f64 = 49.0 * std::f64::consts::PI / 180.0;
const LON_0: f64 = -2.0 * std::f64::consts::PI / 180.0;
const EASTING_0: f64 = 400_000.0;
const NORTHING_0: f64 = -100_000.0;

/// Meridional arc from the true origin to latitude `phi`, on Airy 1830
/// scaled by the central-meridian factor.
fn meridional_arc(phi: f64) -> f64 {
    let Ellipsoid { a, b } = AIRY_1830;
    let n = (a - b) / (a + b);
    let n2 = n * n;
    let n3 = n2 * n;

    let ma = (1.0 + n + 1.25 * n2 + 1.25 * n3) * (phi - LAT_0);
    let mb = (3.0 * n + 3.0 * n2 + (21.0 / 8.0) * n3) * (phi - LAT_0).sin() * (phi + LAT_0).cos();
    let mc = (15.0 / 8.0) * (n2 + n3) * (2.0 * (phi - LAT_0)).sin() * (2.0 * (phi + LAT_0)).cos();
    let md = (35.0 / 24.0) * n3 * (3.0 * (phi - LAT_0)).sin() * (3.0 * (phi + LAT_0)).cos();

    b * SCALE_0 * (ma - mb + mc - md)
}

/// Radii of curvature on Airy 1830 at latitude `phi`, scaled: transverse
/// `nu`, meridional `rho`, and `eta2 = nu/rho − 1`.
fn curvature(sin_phi: f64) -> (f64, f64, f64) {
    let a = AIRY_1830.a;
    let e2 = AIRY_1830.e2();

    let nu = a * SCALE_0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = a * SCALE_0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    (nu, rho, nu / rho - 1.0)
}

/// Inverse transverse Mercator: grid metres to OSGB36 latitude/longitude in
/// radians. Iterates the meridional arc to the footpoint latitude, then
/// applies the series corrections for the easting offset from the central
/// meridian.
fn unproject(easting: f64, northing: f64) -> (f64, f64) {
    let a = AIRY_1830.a;

    let mut phi = LAT_0;
    let mut m = 0.0;
    // Converges in a handful of steps anywhere on the grid; the bound
    // keeps extrapolated inputs from spinning.
    for _ in 0..12 {
        let delta = (northing - NORTHING_0 - m) / (a * SCALE_0);
        phi += delta;
        m = meridional_arc(phi);
        if delta.abs() < 1e-12 {
            break;
        }
    }

    let (sin_phi, cos_phi) = phi.sin_cos();
    let (nu, rho, eta2) = curvature(sin_phi);

    let tan_phi = sin_phi / cos_phi;
    let tan2 = tan_phi * tan_phi;
    let tan4 = tan2 * tan2;
    let tan6 = tan4 * tan2;
    let sec_phi = 1.0 / cos_phi;
    let nu3 = nu * nu * nu;
    let nu5 = nu3 * nu * nu;
    let nu7 = nu5 * nu * nu;

    let vii = tan_phi / (2.0 * rho * nu);
    let viii = tan_phi / (24.0 * rho * nu3) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
    let ix = tan_phi / (720.0 * rho * nu5) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
    let x = sec_phi / nu;
    let xi = sec_phi / (6.0 * nu3) * (nu / rho + 2.0 * tan2);
    let xii = sec_phi / (120.0 * nu5) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
    let xiia = sec_phi / (5040.0 * nu7) * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

    let de = easting - EASTING_0;
    let de2 = de * de;
    let de3 = de2 * de;
    let de4 = de2 * de2;
    let de5 = de4 * de;
    let de6 = de4 * de2;
    let de7 = de6 * de;

    let lat = phi - vii * de2 + viii * de4 - ix * de6;
    let lon = LON_0 + x * de - xi * de3 + xii * de5 - xiia * de7;

    (lat, lon)
}

/// Forward transverse Mercator: OSGB36 latitude/longitude in radians to grid
/// metres.
fn project(phi: f64, lam: f64) -> (f64, f64) {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (nu, rho, eta2) = curvature(sin_phi);

    let tan_phi = sin_phi / cos_phi;
    let tan2 = tan_phi * tan_phi;
    let tan4 = tan2 * tan2;
    let cos3 = cos_phi.powi(3);
    let cos5 = cos_phi.powi(5);

    let i = meridional_arc(phi) + NORTHING_0;
    let ii = nu / 2.0 * sin_phi * cos_phi;
    let iii = nu / 24.0 * sin_phi * cos3 * (5.0 - tan2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin_phi * cos5 * (61.0 - 58.0 * tan2 + tan4);
    let iv = nu * cos_phi;
    let v = nu / 6.0 * cos3 * (nu / rho - tan2);
    let vi = nu / 120.0 * cos5 * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

    let dl = lam - LON_0;
    let dl2 = dl * dl;
    let dl3 = dl2 * dl;
    let dl4 = dl2 * dl2;
    let dl5 = dl4 * dl;
    let dl6 = dl4 * dl2;

    let easting = EASTING_0 + iv * dl + v * dl3 + vi * dl5;
    let northing = i + ii * dl2 + iii * dl4 + iiia * dl6;

    (easting, northing)
}

impl GridRef {
    /// Latitude/longitude of this reference on the OSGB36 datum.
    pub fn to_lat_lon_osgb36(&self) -> LatLon {
        let (lat, lon) = unproject(f64::from(self.easting()), f64::from(self.northing()));
        LatLon::new(lat.to_degrees(), lon.to_degrees())
    }

    /// Latitude/longitude of this reference on the WGS84 datum.
    pub fn to_lat_lon(&self) -> LatLon {
        let osgb36 = self.to_lat_lon_osgb36();
        OSGB36_TO_WGS84
            .apply(Cartesian::from_geodetic(osgb36, AIRY_1830))
            .to_geodetic(WGS84)
    }

    /// Grid reference of a WGS84 position, rounded to the nearest metre.
    ///
    /// # Errors
    ///
    /// [`Terrain50Error::InvalidFormat`](crate::Terrain50Error::InvalidFormat)
    /// if the position projects outside the grid extent.
    pub fn from_lat_lon(point: LatLon) -> Result<Self> {
        let osgb36 = OSGB36_TO_WGS84
            .inverse()
            .apply(Cartesian::from_geodetic(point, WGS84))
            .to_geodetic(AIRY_1830);

        let (easting, northing) = project(osgb36.lat.to_radians(), osgb36.lon.to_radians());
        GridRef::new(easting.round() as i32, northing.round() as i32)
    }
}

/// Constrain degrees to −90..+90 (latitude); e.g. −91 → −89, 91 → 89.
pub fn wrap90(degrees: f64) -> f64 {
    if (-90.0..=90.0).contains(&degrees) {
        return degrees;
    }
    // triangle wave: f(x) = 4a/p · |((x − p/4) mod p) − p/2| − a
    let (a, p) = (90.0, 360.0);
    4.0 * a / p * ((degrees - p / 4.0).rem_euclid(p) - p / 2.0).abs() - a
}

/// Constrain degrees to −180..+180 (longitude); e.g. −181 → 179, 181 → −179.
pub fn wrap180(degrees: f64) -> f64 {
    if (-180.0..=180.0).contains(&degrees) {
        return degrees;
    }
    // sawtooth wave: f(x) = ((2ax/p − p/2) mod p) − a
    let (a, p) = (180.0, 360.0);
    (2.0 * a * degrees / p - p / 2.0).rem_euclid(p) - a
}

/// Constrain degrees to 0..360 (bearings); e.g. −1 → 359, 361 → 1.
pub fn wrap360(degrees: f64) -> f64 {
    if (0.0..=360.0).contains(&degrees) {
        return degrees;
    }
    let (a, p) = (180.0, 360.0);
    (2.0 * a * degrees / p).rem_euclid(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual} (tolerance {tolerance})"
        );
    }

    #[test]
    fn test_osgb36_known_points() {
        // Expected values from movable-type.co.uk/scripts/latlong-os-gridref
        let cases: &[(&str, f64, f64)] = &[
            ("SJ 92395 52997", 53.073851, -2.113526),
            ("TG 51409 13177", 52.657568, 1.717908),
            ("TL 44982 57869", 52.199558, 0.121654),
        ];
        for (reference, lat, lon) in cases {
            let point = reference.parse::<GridRef>().unwrap().to_lat_lon_osgb36();
            assert_close(point.lat, *lat, 2e-6);
            assert_close(point.lon, *lon, 2e-6);
        }
    }

    #[test]
    fn test_osgb36_os_worked_example() {
        let point = GridRef::new(651_410, 313_177).unwrap().to_lat_lon_osgb36();
        assert_close(point.lat, 52.0 + 39.0 / 60.0 + 27.2531 / 3600.0, 2e-6);
        assert_close(point.lon, 1.0 + 43.0 / 60.0 + 4.5177 / 3600.0, 2e-6);
    }

    #[test]
    fn test_wgs84_known_point() {
        let point = "SJ 92395 52997".parse::<GridRef>().unwrap().to_lat_lon();
        assert_close(point.lat, 53.074149, 2e-6);
        assert_close(point.lon, -2.114964, 2e-6);
    }

    #[test]
    fn test_projection_round_trip() {
        // Forward after inverse closes to well under a micrometre near the
        // central meridian; series truncation grows with easting offset.
        for (easting, northing) in [(409_500.0, 425_500.0), (321_540.0, 507_216.0)] {
            let (phi, lam) = unproject(easting, northing);
            let (e, n) = project(phi, lam);
            assert_close(e, easting, 1e-6);
            assert_close(n, northing, 1e-6);
        }
    }

    #[test]
    fn test_round_trip_to_the_metre() {
        for reference in ["SE 09500 25500", "TL 44982 57869", "NY 21108 10343"] {
            let gridref = reference.parse::<GridRef>().unwrap();
            let back = GridRef::from_lat_lon(gridref.to_lat_lon()).unwrap();
            assert_eq!(back, gridref, "round trip of {reference}");
        }
    }

    #[test]
    fn test_from_lat_lon_outside_grid() {
        // Paris
        assert!(GridRef::from_lat_lon(LatLon::new(48.8566, 2.3522)).is_err());
    }

    #[test]
    fn test_helmert_inverse_composes_to_identity() {
        let c = Cartesian {
            x: 3_800_000.0,
            y: -130_000.0,
            z: 5_100_000.0,
        };
        let back = OSGB36_TO_WGS84.inverse().apply(OSGB36_TO_WGS84.apply(c));
        // Linearised rotations: composition closes to second order only.
        assert_close(back.x, c.x, 1e-3);
        assert_close(back.y, c.y, 1e-3);
        assert_close(back.z, c.z, 1e-3);
    }

    #[test]
    fn test_cartesian_geodetic_round_trip() {
        let point = LatLon::new(53.5, -1.25);
        let back = Cartesian::from_geodetic(point, WGS84).to_geodetic(WGS84);
        assert_close(back.lat, point.lat, 1e-9);
        assert_close(back.lon, point.lon, 1e-9);
    }

    #[test]
    fn test_wrap90() {
        assert_eq!(wrap90(45.0), 45.0);
        assert_eq!(wrap90(90.0), 90.0);
        assert_close(wrap90(91.0), 89.0, 1e-9);
        assert_close(wrap90(-91.0), -89.0, 1e-9);
        assert_close(wrap90(181.0), -1.0, 1e-9);
    }

    #[test]
    fn test_wrap180() {
        assert_eq!(wrap180(179.0), 179.0);
        assert_close(wrap180(181.0), -179.0, 1e-9);
        assert_close(wrap180(-181.0), 179.0, 1e-9);
        assert_close(wrap180(360.0 + 10.0), 10.0, 1e-9);
    }

    #[test]
    fn test_wrap360() {
        assert_eq!(wrap360(359.0), 359.0);
        assert_close(wrap360(-1.0), 359.0, 1e-9);
        assert_close(wrap360(361.0), 1.0, 1e-9);
    }
}
