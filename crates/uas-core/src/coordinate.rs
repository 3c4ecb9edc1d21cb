//! Geographic coordinates and geodesic offset math.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle math.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// An immutable geographic point.
///
/// Latitude and longitude are in decimal degrees, altitude in meters.
/// Every operation returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
    #[serde(alias = "alt")]
    pub altitude_m: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64, altitude_m: f64) -> Self {
        Self {
            lat,
            lon,
            altitude_m,
        }
    }

    /// Build a coordinate from degrees-minutes-seconds triples.
    ///
    /// The sign of the degrees component applies to the whole value, so
    /// `(-76, 33, 6)` is 76°33'06" west.
    pub fn from_dms(lat: (f64, f64, f64), lon: (f64, f64, f64), altitude_m: f64) -> Self {
        Self {
            lat: dms_to_decimal(lat),
            lon: dms_to_decimal(lon),
            altitude_m,
        }
    }

    /// Same point with a different altitude.
    pub fn with_altitude(self, altitude_m: f64) -> Self {
        Self { altitude_m, ..self }
    }

    /// Project a new point `distance_m` away along `heading_deg`
    /// (0 = north, 90 = east). Altitude is carried over unchanged.
    pub fn offset_coordinate(&self, distance_m: f64, heading_deg: f64) -> Self {
        if distance_m.abs() <= f64::EPSILON {
            return *self;
        }

        let bearing_rad = heading_deg.to_radians();
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();
        let angular_distance = distance_m / EARTH_RADIUS_M;

        let sin_lat1 = lat1.sin();
        let cos_lat1 = lat1.cos();
        let sin_ad = angular_distance.sin();
        let cos_ad = angular_distance.cos();

        let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
        let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

        let y = bearing_rad.sin() * sin_ad * cos_lat1;
        let x = cos_ad - sin_lat1 * sin_lat2;
        let mut lon2 = lon1 + y.atan2(x);
        lon2 = (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI)
            - std::f64::consts::PI;

        Self {
            lat: lat2.to_degrees(),
            lon: lon2.to_degrees(),
            altitude_m: self.altitude_m,
        }
    }

    /// Great-circle distance in meters (haversine), ignoring altitude.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let dphi = (other.lat - self.lat).to_radians();
        let dlambda = (other.lon - self.lon).to_radians();
        let a = (dphi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial bearing towards `other` in degrees, normalised to [0, 360).
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let delta_lambda = (other.lon - self.lon).to_radians();

        let y = delta_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.7}, {:.7}, {:.1}m)", self.lat, self.lon, self.altitude_m)
    }
}

fn dms_to_decimal((degrees, minutes, seconds): (f64, f64, f64)) -> f64 {
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if degrees.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}
