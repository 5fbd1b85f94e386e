//! Projected → geographic coordinate conversion for open-data rows.
//!
//! The license datasets publish positions in EPSG:5174 (Korean 1985 /
//! modified central belt, Bessel 1841). Matching needs WGS84 degrees.

use std::f64::consts::PI;

use storewatch_common::Coordinate;

pub trait CoordTransform: Send + Sync {
    /// Convert projected easting/northing to WGS84. `None` for input that
    /// cannot be a position.
    fn to_wgs84(&self, x: f64, y: f64) -> Option<Coordinate>;
}

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    inv_f: f64,
}

impl Ellipsoid {
    fn e2(&self) -> f64 {
        let f = 1.0 / self.inv_f;
        2.0 * f - f * f
    }
}

const BESSEL_1841: Ellipsoid = Ellipsoid {
    a: 6_377_397.155,
    inv_f: 299.152_812_8,
};

const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    inv_f: 298.257_223_563,
};

/// Seven-parameter Helmert shift, position-vector convention.
#[derive(Debug, Clone, Copy)]
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    /// Rotations in arc-seconds.
    rx: f64,
    ry: f64,
    rz: f64,
    /// Scale in parts per million.
    ppm: f64,
}

impl Helmert {
    fn apply(&self, (x, y, z): (f64, f64, f64)) -> (f64, f64, f64) {
        let sec = PI / (180.0 * 3600.0);
        let (rx, ry, rz) = (self.rx * sec, self.ry * sec, self.rz * sec);
        let s = 1.0 + self.ppm * 1e-6;
        (
            self.tx + s * (x - rz * y + ry * z),
            self.ty + s * (rz * x + y - rx * z),
            self.tz + s * (-ry * x + rx * y + z),
        )
    }
}

/// Inverse transverse Mercator on Bessel 1841 plus a datum shift to WGS84.
#[derive(Debug, Clone, Copy)]
pub struct Epsg5174 {
    lat0: f64,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    to_wgs84: Helmert,
}

impl Default for Epsg5174 {
    fn default() -> Self {
        Self {
            lat0: 38.0,
            lon0: 127.002_890_277_777_8,
            k0: 1.0,
            false_easting: 200_000.0,
            false_northing: 500_000.0,
            to_wgs84: Helmert {
                tx: -115.80,
                ty: 474.99,
                tz: 674.11,
                rx: 1.16,
                ry: -2.31,
                rz: -1.63,
                ppm: 6.43,
            },
        }
    }
}

impl Epsg5174 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projected meters to Bessel latitude/longitude in degrees.
    pub fn tm_inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let a = BESSEL_1841.a;
        let e2 = BESSEL_1841.e2();
        let ep2 = e2 / (1.0 - e2);

        let m = meridian_arc(self.lat0.to_radians(), a, e2) + (y - self.false_northing) / self.k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1, tan1) = (phi1.sin(), phi1.cos(), phi1.tan());
        let c1 = ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let n1 = a / (1.0 - e2 * sin1 * sin1).sqrt();
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
        let d = (x - self.false_easting) / (n1 * self.k0);

        let lat = phi1
            - (n1 * tan1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = self.lon0.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos1;

        (lat.to_degrees(), lon.to_degrees())
    }
}

impl CoordTransform for Epsg5174 {
    fn to_wgs84(&self, x: f64, y: f64) -> Option<Coordinate> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (lat, lon) = self.tm_inverse(x, y);
        let ecef = geodetic_to_ecef(lat.to_radians(), lon.to_radians(), BESSEL_1841);
        let shifted = self.to_wgs84.apply(ecef);
        let (lat, lon) = ecef_to_geodetic(shifted, WGS84);
        let coordinate = Coordinate::new(lat.to_degrees(), lon.to_degrees());
        coordinate.is_usable().then_some(coordinate)
    }
}

fn meridian_arc(phi: f64, a: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

fn geodetic_to_ecef(phi: f64, lambda: f64, ellipsoid: Ellipsoid) -> (f64, f64, f64) {
    let e2 = ellipsoid.e2();
    let n = ellipsoid.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
    (
        n * phi.cos() * lambda.cos(),
        n * phi.cos() * lambda.sin(),
        n * (1.0 - e2) * phi.sin(),
    )
}

fn ecef_to_geodetic((x, y, z): (f64, f64, f64), ellipsoid: Ellipsoid) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let p = x.hypot(y);
    let lambda = y.atan2(x);
    let mut phi = z.atan2(p * (1.0 - e2));
    for _ in 0..8 {
        let n = ellipsoid.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let h = p / phi.cos() - n;
        phi = z.atan2(p * (1.0 - e2 * n / (n + h)));
    }
    (phi, lambda)
}
