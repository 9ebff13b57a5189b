//! Distance units and spherical-cap helpers.

use crate::types::{GeoBounds, GeoLocation};
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters, the same radius `geo::Haversine` uses.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

const METERS_PER_KILOMETER: f64 = 1_000.0;
const METERS_PER_MILE: f64 = 1_609.344;

/// Unit in which radii are supplied and hit distances are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
}

impl DistanceUnit {
    /// Convert a value in this unit to meters.
    ///
    /// ```
    /// use geocell::DistanceUnit;
    ///
    /// assert_eq!(DistanceUnit::Kilometers.to_meters(2.5), 2_500.0);
    /// assert_eq!(DistanceUnit::Miles.to_meters(1.0), 1_609.344);
    /// ```
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Kilometers => value * METERS_PER_KILOMETER,
            DistanceUnit::Miles => value * METERS_PER_MILE,
        }
    }

    /// Convert meters to this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / METERS_PER_KILOMETER,
            DistanceUnit::Miles => meters / METERS_PER_MILE,
        }
    }
}

/// Latitude/longitude rectangle enclosing the spherical cap of `radius_meters`
/// around `center`.
///
/// The latitude extent is exact; the longitude extent uses the tangent
/// meridians of the cap. A cap that reaches a pole spans every longitude.
pub fn cap_bounds(center: &GeoLocation, radius_meters: f64) -> GeoBounds {
    let angle = radius_meters / EARTH_RADIUS_METERS;
    let dlat = angle.to_degrees();
    let min_lat = center.lat() - dlat;
    let max_lat = center.lat() + dlat;

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return GeoBounds::new(min_lat.max(-90.0), max_lat.min(90.0), -180.0, 180.0);
    }

    let ratio = angle.sin() / center.lat().to_radians().cos();
    if angle >= std::f64::consts::FRAC_PI_2 || ratio >= 1.0 {
        return GeoBounds::new(min_lat, max_lat, -180.0, 180.0);
    }

    let dlon = ratio.asin().to_degrees();
    let mut min_lon = center.lon() - dlon;
    let mut max_lon = center.lon() + dlon;
    if max_lon - min_lon >= 360.0 {
        return GeoBounds::new(min_lat, max_lat, -180.0, 180.0);
    }
    if min_lon < -180.0 {
        min_lon += 360.0;
    }
    if max_lon > 180.0 {
        max_lon -= 360.0;
    }
    GeoBounds::new(min_lat, max_lat, min_lon, max_lon)
}
