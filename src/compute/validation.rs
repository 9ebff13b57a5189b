//! Validation for geographic coordinates, radii, rectangles, and cell levels.

use crate::cell::MAX_LEVEL;
use crate::error::{GeoCellError, Result};
use crate::types::GeoBounds;

/// Validates a latitude/longitude pair.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use geocell::compute::validation::validate_lat_lon;
///
/// assert!(validate_lat_lon(40.7128, -74.0060).is_ok());
/// assert!(validate_lat_lon(95.0, -74.0).is_err());
/// assert!(validate_lat_lon(40.0, 200.0).is_err());
/// ```
pub fn validate_lat_lon(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() {
        return Err(GeoCellError::out_of_range(
            "lat",
            format!("latitude must be finite, got: {}", lat),
        ));
    }

    if !lon.is_finite() {
        return Err(GeoCellError::out_of_range(
            "lon",
            format!("longitude must be finite, got: {}", lon),
        ));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoCellError::out_of_range(
            "lat",
            format!("latitude outside [-90.0, 90.0]: {}", lat),
        ));
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeoCellError::out_of_range(
            "lon",
            format!("longitude outside [-180.0, 180.0]: {}", lon),
        ));
    }

    Ok(())
}

/// Validates a cell level.
///
/// # Examples
///
/// ```
/// use geocell::compute::validation::validate_level;
///
/// assert!(validate_level(0).is_ok());
/// assert!(validate_level(30).is_ok());
/// assert!(validate_level(31).is_err());
/// ```
pub fn validate_level(level: u8) -> Result<()> {
    if level > MAX_LEVEL {
        return Err(GeoCellError::out_of_range(
            "level",
            format!("expected 0..={}, got {}", MAX_LEVEL, level),
        ));
    }
    Ok(())
}

/// Validates a search radius in meters.
///
/// Ensures the radius is positive, finite, and not larger than half the
/// earth's circumference (anything beyond already covers the sphere).
///
/// # Examples
///
/// ```
/// use geocell::compute::validation::validate_radius;
///
/// assert!(validate_radius(1000.0).is_ok());
/// assert!(validate_radius(0.0).is_err());
/// assert!(validate_radius(-100.0).is_err());
/// assert!(validate_radius(f64::NAN).is_err());
/// ```
pub fn validate_radius(radius_meters: f64) -> Result<()> {
    if !radius_meters.is_finite() {
        return Err(GeoCellError::out_of_range(
            "radius",
            format!("radius must be finite, got: {}", radius_meters),
        ));
    }
    if radius_meters <= 0.0 {
        return Err(GeoCellError::out_of_range(
            "radius",
            format!("radius must be positive, got: {}", radius_meters),
        ));
    }
    const HALF_EARTH_CIRCUMFERENCE: f64 = 20_037_508.0; // meters
    if radius_meters > HALF_EARTH_CIRCUMFERENCE {
        return Err(GeoCellError::out_of_range(
            "radius",
            format!(
                "radius {} exceeds half the earth's circumference ({} meters)",
                radius_meters, HALF_EARTH_CIRCUMFERENCE
            ),
        ));
    }
    Ok(())
}

/// Validates a search rectangle.
///
/// Latitudes must be ordered; longitudes may be reversed, which signals a
/// rectangle wrapping the antimeridian.
///
/// # Examples
///
/// ```
/// use geocell::GeoBounds;
/// use geocell::compute::validation::validate_bounds;
///
/// assert!(validate_bounds(&GeoBounds::new(-10.0, 10.0, -10.0, 10.0)).is_ok());
/// assert!(validate_bounds(&GeoBounds::new(-10.0, 10.0, 170.0, -170.0)).is_ok());
/// assert!(validate_bounds(&GeoBounds::new(10.0, -10.0, -10.0, 10.0)).is_err());
/// ```
pub fn validate_bounds(bounds: &GeoBounds) -> Result<()> {
    validate_lat_lon(bounds.min_lat, bounds.min_lon)?;
    validate_lat_lon(bounds.max_lat, bounds.max_lon)?;

    if bounds.min_lat > bounds.max_lat {
        return Err(GeoCellError::out_of_range(
            "bounds",
            format!(
                "min_lat ({}) must be <= max_lat ({})",
                bounds.min_lat, bounds.max_lat
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_lat_lon() {
        assert!(validate_lat_lon(40.7128, -74.0060).is_ok());
        assert!(validate_lat_lon(51.5074, -0.1278).is_ok());

        // Edge cases
        assert!(validate_lat_lon(90.0, 0.0).is_ok());
        assert!(validate_lat_lon(-90.0, 0.0).is_ok());
        assert!(validate_lat_lon(0.0, 180.0).is_ok());
        assert!(validate_lat_lon(0.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_lat_lon_names_parameter() {
        match validate_lat_lon(90.1, 0.0) {
            Err(GeoCellError::OutOfRange { parameter, .. }) => assert_eq!(parameter, "lat"),
            other => panic!("unexpected result: {:?}", other),
        }
        match validate_lat_lon(0.0, 180.1) {
            Err(GeoCellError::OutOfRange { parameter, .. }) => assert_eq!(parameter, "lon"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_coordinates() {
        assert!(validate_lat_lon(f64::NAN, 0.0).is_err());
        assert!(validate_lat_lon(0.0, f64::NAN).is_err());
        assert!(validate_lat_lon(f64::INFINITY, 0.0).is_err());
        assert!(validate_lat_lon(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_level() {
        for level in 0..=30 {
            assert!(validate_level(level).is_ok());
        }
        match validate_level(31) {
            Err(GeoCellError::OutOfRange { parameter, .. }) => assert_eq!(parameter, "level"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius(1000.0).is_ok());
        assert!(validate_radius(0.1).is_ok());
        assert!(validate_radius(20_000_000.0).is_ok());

        assert!(validate_radius(0.0).is_err());
        assert!(validate_radius(-100.0).is_err());
        assert!(validate_radius(f64::INFINITY).is_err());
        assert!(validate_radius(50_000_000.0).is_err());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds(&GeoBounds::new(-90.0, 90.0, -180.0, 180.0)).is_ok());
        assert!(validate_bounds(&GeoBounds::new(0.0, 0.0, 5.0, 5.0)).is_ok());
        assert!(validate_bounds(&GeoBounds::new(-10.0, 10.0, 170.0, -170.0)).is_ok());

        assert!(validate_bounds(&GeoBounds::new(10.0, -10.0, 0.0, 1.0)).is_err());
        assert!(validate_bounds(&GeoBounds::new(-100.0, 10.0, 0.0, 1.0)).is_err());
        assert!(validate_bounds(&GeoBounds::new(-10.0, 10.0, 0.0, 181.0)).is_err());
    }
}
