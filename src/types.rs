//! Geographic value types shared by the codec, planner, and search layers.

use crate::compute::validation::validate_lat_lon;
use crate::error::Result;
use geo::{Distance, Haversine};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// A latitude/longitude pair in degrees.
///
/// Longitude carries no meaning exactly at the poles, but every value still
/// encodes to a deterministic cell.
///
/// # Examples
///
/// ```
/// use geocell::GeoLocation;
///
/// let sf = GeoLocation::new(37.7749, -122.4194)?;
/// assert_eq!(sf.lat(), 37.7749);
/// assert!(GeoLocation::new(91.0, 0.0).is_err());
/// # Ok::<(), geocell::GeoCellError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    lat: f64,
    lon: f64,
}

impl GeoLocation {
    /// Create a validated location.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        validate_lat_lon(lat, lon)?;
        Ok(Self { lat, lon })
    }

    /// Build a location from coordinates produced by this crate's own math.
    ///
    /// Values are clamped into range instead of being rejected.
    pub(crate) fn clamped(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.clamp(-90.0, 90.0),
            lon: lon.clamp(-180.0, 180.0),
        }
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance in meters (haversine, mean earth radius).
    pub fn haversine_distance(&self, other: &GeoLocation) -> f64 {
        Haversine.distance(geo::Point::from(*self), geo::Point::from(*other))
    }
}

impl From<GeoLocation> for geo::Point<f64> {
    fn from(location: GeoLocation) -> Self {
        geo::Point::new(location.lon, location.lat)
    }
}

impl TryFrom<geo::Point<f64>> for GeoLocation {
    type Error = crate::error::GeoCellError;

    fn try_from(point: geo::Point<f64>) -> Result<Self> {
        GeoLocation::new(point.y(), point.x())
    }
}

/// A latitude/longitude rectangle.
///
/// `min_lon > max_lon` means the rectangle wraps across the antimeridian:
/// it covers `[min_lon, 180]` and `[-180, max_lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// The whole sphere.
    pub fn full() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    /// True when the rectangle crosses the ±180° meridian.
    pub fn wraps(&self) -> bool {
        self.min_lon > self.max_lon
    }

    /// True when the rectangle spans every longitude.
    pub fn is_full_lon(&self) -> bool {
        !self.wraps() && self.min_lon <= -180.0 && self.max_lon >= 180.0
    }

    /// Longitude span in degrees, accounting for wrap.
    pub fn lon_span(&self) -> f64 {
        if self.wraps() {
            360.0 - (self.min_lon - self.max_lon)
        } else {
            self.max_lon - self.min_lon
        }
    }

    /// Non-wrapping longitude intervals covered by the rectangle.
    pub fn lon_intervals(&self) -> SmallVec<[(f64, f64); 2]> {
        if self.wraps() {
            smallvec![(self.min_lon, 180.0), (-180.0, self.max_lon)]
        } else {
            smallvec![(self.min_lon, self.max_lon)]
        }
    }

    pub fn contains_lon(&self, lon: f64) -> bool {
        if self.wraps() {
            lon >= self.min_lon || lon <= self.max_lon
        } else {
            lon >= self.min_lon && lon <= self.max_lon
        }
    }

    pub fn contains(&self, location: &GeoLocation) -> bool {
        location.lat() >= self.min_lat
            && location.lat() <= self.max_lat
            && self.contains_lon(location.lon())
    }

    pub fn intersects(&self, other: &GeoBounds) -> bool {
        if self.max_lat < other.min_lat || self.min_lat > other.max_lat {
            return false;
        }
        self.lon_intervals().iter().any(|&(a_min, a_max)| {
            other
                .lon_intervals()
                .iter()
                .any(|&(b_min, b_max)| a_min <= b_max && b_min <= a_max)
        })
    }

    /// Midpoint of the rectangle, taking wrap into account.
    pub fn center(&self) -> GeoLocation {
        let lat = (self.min_lat + self.max_lat) / 2.0;
        let mut lon = self.min_lon + self.lon_span() / 2.0;
        if lon > 180.0 {
            lon -= 360.0;
        }
        GeoLocation::clamped(lat, lon)
    }

    /// The four corners, south-west first, counter-clockwise.
    pub fn corners(&self) -> [GeoLocation; 4] {
        [
            GeoLocation::clamped(self.min_lat, self.min_lon),
            GeoLocation::clamped(self.min_lat, self.max_lon),
            GeoLocation::clamped(self.max_lat, self.max_lon),
            GeoLocation::clamped(self.max_lat, self.min_lon),
        ]
    }

    /// Split into `geo::Rect` pieces (two when wrapping).
    pub fn to_rects(&self) -> SmallVec<[geo::Rect<f64>; 2]> {
        self.lon_intervals()
            .into_iter()
            .map(|(min_lon, max_lon)| {
                geo::Rect::new(
                    geo::coord! { x: min_lon, y: self.min_lat },
                    geo::coord! { x: max_lon, y: self.max_lat },
                )
            })
            .collect()
    }
}
