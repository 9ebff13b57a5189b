//! Coverage planning: the set of cells to query for a search region.
//!
//! The planner picks a level from the search radius, samples the region's
//! bounding rectangle densely enough that every cell touching the region is
//! either sampled or adjacent to a sampled cell, then adds one ring of
//! neighbors to close the gaps. The candidate count is checked against the
//! configured cap before any query runs.

use crate::cell::{CellId, MAX_LEVEL};
use crate::compute::distance::{EARTH_RADIUS_METERS, cap_bounds};
use crate::compute::validation::{validate_bounds, validate_radius};
use crate::config::QueryConfig;
use crate::error::{GeoCellError, Result};
use crate::types::{GeoBounds, GeoLocation};
use std::collections::BTreeSet;

/// Average cell edge length at level 0, in radians.
const AVG_EDGE_LEVEL0: f64 = 1.459_213_746_386_106;

/// Minimum cell width at level 0, in radians.
const MIN_WIDTH_LEVEL0: f64 = 2.0 * std::f64::consts::SQRT_2 / 3.0;

/// Sample spacing as a fraction of the minimum cell width.
const SAMPLE_SPACING: f64 = 0.4;

/// Rectangles estimated to need this many times the cap are rejected
/// without sampling.
const ESTIMATE_SLACK: f64 = 4.0;

/// Cells selected for one search, sorted by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Covering {
    level: u8,
    cells: Vec<CellId>,
}

impl Covering {
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.cells.iter().map(|cell| cell.to_token()).collect()
    }

    /// True when the cell containing `location` at the covering level is
    /// part of the covering.
    pub fn covers(&self, location: &GeoLocation) -> bool {
        CellId::from_location(location, self.level)
            .map(|cell| self.cells.binary_search(&cell).is_ok())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct CoveragePlanner {
    max_cells: usize,
    min_level: u8,
    max_level: u8,
    cell_width_ratio: f64,
    fixed_level: Option<u8>,
}

impl CoveragePlanner {
    /// Planner for a validated configuration. Queries never go finer than
    /// the configured index level.
    pub fn new(config: &QueryConfig) -> Self {
        let max_level = config.index_level.min(MAX_LEVEL);
        Self {
            max_cells: config.max_cells,
            min_level: config.min_level.min(max_level),
            max_level,
            cell_width_ratio: config.cell_width_ratio,
            fixed_level: config.level.map(|level| level.min(max_level)),
        }
    }

    /// Plan every covering at the index level, for stores that look cells
    /// up by exact token.
    pub fn pinned_to_index_level(mut self) -> Self {
        self.fixed_level = Some(self.max_level);
        self
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    /// Query level for a radius.
    ///
    /// The finest level whose average cell edge is at least
    /// `cell_width_ratio * radius`, clamped to the configured range. A fixed
    /// level from the configuration wins.
    ///
    /// ```
    /// use geocell::{CoveragePlanner, QueryConfig};
    ///
    /// let planner = CoveragePlanner::new(&QueryConfig::default().with_index_level(20));
    /// let city = planner.level_for_radius(5_000.0);
    /// let block = planner.level_for_radius(100.0);
    /// assert!(block > city);
    /// ```
    pub fn level_for_radius(&self, radius_meters: f64) -> u8 {
        if let Some(level) = self.fixed_level {
            return level;
        }
        let target = self.cell_width_ratio * radius_meters / EARTH_RADIUS_METERS;
        let level = (AVG_EDGE_LEVEL0 / target).log2().floor();
        if level.is_nan() {
            return self.max_level;
        }
        level.clamp(self.min_level as f64, self.max_level as f64) as u8
    }

    /// Cells covering the disk of `radius_meters` around `center`.
    pub fn cover_radius(&self, center: &GeoLocation, radius_meters: f64) -> Result<Covering> {
        validate_radius(radius_meters)?;
        let level = self.level_for_radius(radius_meters);
        let region = cap_bounds(center, radius_meters);
        self.cover_region(&region, level)
    }

    /// Cells covering a latitude/longitude rectangle.
    ///
    /// The level is chosen as for a disk whose radius is the distance from
    /// the rectangle's center to its farthest corner.
    pub fn cover_bounds(&self, bounds: &GeoBounds) -> Result<Covering> {
        validate_bounds(bounds)?;
        let radius = equivalent_radius(bounds);
        let level = self.level_for_radius(radius.max(1.0));
        self.cover_region(bounds, level)
    }

    fn cover_region(&self, region: &GeoBounds, level: u8) -> Result<Covering> {
        let estimate = estimated_cells(region, level);
        if estimate > self.max_cells as f64 * ESTIMATE_SLACK {
            return Err(self.too_large(estimate.ceil() as usize, level));
        }

        let mut cells = BTreeSet::new();
        for location in sample_grid(region, level) {
            let cell = CellId::from_location(&location, level)?;
            if cells.insert(cell) && cells.len() > self.max_cells {
                return Err(self.too_large(cells.len(), level));
            }
        }
        let sampled = cells.len();

        let seeds: Vec<CellId> = cells.iter().copied().collect();
        for seed in seeds {
            for neighbor in seed.neighbors() {
                if cells.contains(&neighbor) || !neighbor.bounds().intersects(region) {
                    continue;
                }
                cells.insert(neighbor);
                if cells.len() > self.max_cells {
                    return Err(self.too_large(cells.len(), level));
                }
            }
        }

        log::debug!(
            "covering at level {}: {} cells ({} sampled, {} from neighbors)",
            level,
            cells.len(),
            sampled,
            cells.len() - sampled
        );
        Ok(Covering {
            level,
            cells: cells.into_iter().collect(),
        })
    }

    fn too_large(&self, required: usize, level: u8) -> GeoCellError {
        log::warn!(
            "refusing covering at level {}: {} cells exceed cap {}",
            level,
            required,
            self.max_cells
        );
        GeoCellError::CoverageTooLarge {
            required,
            cap: self.max_cells,
            level,
        }
    }
}

/// Distance in meters from the center of `bounds` to its farthest corner.
fn equivalent_radius(bounds: &GeoBounds) -> f64 {
    let center = bounds.center();
    bounds
        .corners()
        .iter()
        .map(|corner| center.haversine_distance(corner))
        .fold(0.0, f64::max)
}

/// Rectangle area divided by the average cell area at `level`.
fn estimated_cells(region: &GeoBounds, level: u8) -> f64 {
    let steradians = region.lon_span().to_radians()
        * (region.max_lat.to_radians().sin() - region.min_lat.to_radians().sin());
    let cell_steradians = 4.0 * std::f64::consts::PI / 6.0 / 4f64.powi(level as i32);
    steradians / cell_steradians
}

/// Evenly spaced sample points over `region`, both edges included.
///
/// Rows are at most `step` degrees apart. Columns are spaced so that the
/// ground distance between them is at most `step` on the row closest to the
/// equator, and therefore on every row.
fn sample_grid(region: &GeoBounds, level: u8) -> impl Iterator<Item = GeoLocation> + '_ {
    let step = (MIN_WIDTH_LEVEL0 / f64::from(1u32 << level)).to_degrees() * SAMPLE_SPACING;

    let widest_lat = if region.min_lat <= 0.0 && region.max_lat >= 0.0 {
        0.0
    } else {
        region.min_lat.abs().min(region.max_lat.abs())
    };
    let lon_step = step / widest_lat.to_radians().cos().max(f64::EPSILON);

    let lat_span = region.max_lat - region.min_lat;
    let lon_span = region.lon_span();
    let rows = divisions(lat_span, step);
    let columns = divisions(lon_span, lon_step);

    (0..=rows).flat_map(move |row| {
        let lat = region.min_lat + lat_span * row as f64 / rows.max(1) as f64;
        (0..=columns).map(move |column| {
            let mut lon = region.min_lon + lon_span * column as f64 / columns.max(1) as f64;
            if lon > 180.0 {
                lon -= 360.0;
            }
            GeoLocation::clamped(lat, lon)
        })
    })
}

fn divisions(span: f64, step: f64) -> u64 {
    if span <= 0.0 {
        0
    } else {
        (span / step).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use geo::{Destination, Haversine};

    fn planner(config: QueryConfig) -> CoveragePlanner {
        CoveragePlanner::new(&config)
    }

    fn disk_points(center: &GeoLocation, radius: f64) -> Vec<GeoLocation> {
        let mut points = vec![*center];
        for fraction in [0.25, 0.5, 0.75, 0.999] {
            for bearing in (0..360).step_by(10) {
                let p = Haversine.destination((*center).into(), bearing as f64, radius * fraction);
                points.push(GeoLocation::new(p.y(), p.x()).unwrap());
            }
        }
        points
    }

    #[test]
    fn test_level_for_radius_is_monotonic() {
        let planner = planner(QueryConfig::default().with_index_level(30));
        let mut previous = 0;
        for radius in [1_000_000.0, 100_000.0, 10_000.0, 1_000.0, 100.0, 10.0] {
            let level = planner.level_for_radius(radius);
            assert!(level >= previous);
            previous = level;
        }
        // A 1 km radius lands on cells of roughly 1-2 km.
        assert_eq!(planner.level_for_radius(1_000.0), 13);
    }

    #[test]
    fn test_level_is_clamped() {
        let planner = planner(QueryConfig::default().with_index_level(12).with_min_level(4));
        assert_eq!(planner.level_for_radius(1.0), 12);
        assert_eq!(planner.level_for_radius(20_000_000.0), 4);

        let fixed = CoveragePlanner::new(&QueryConfig::default().with_level(7));
        assert_eq!(fixed.level_for_radius(1.0), 7);
    }

    #[test]
    fn test_pinned_planner_uses_index_level() {
        let planner = planner(QueryConfig::default()).pinned_to_index_level();
        assert_eq!(planner.level_for_radius(1_000.0), 16);
        assert_eq!(planner.level_for_radius(1.0), 16);

        let center = GeoLocation::new(37.7955, -122.3937).unwrap();
        let covering = planner.cover_radius(&center, 1_000.0).unwrap();
        assert_eq!(covering.level(), 16);
        assert!(covering.cells().iter().all(|cell| cell.level() == 16));
        for point in disk_points(&center, 1_000.0) {
            assert!(covering.covers(&point));
        }
    }

    #[test]
    fn test_cover_radius_contains_disk() {
        let planner = planner(QueryConfig::default());
        for &(lat, lon, radius) in &[
            (37.7749, -122.4194, 1_000.0),
            (0.0, 0.0, 25_000.0),
            (-33.8688, 151.2093, 300.0),
        ] {
            let center = GeoLocation::new(lat, lon).unwrap();
            let covering = planner.cover_radius(&center, radius).unwrap();
            assert!(!covering.is_empty());
            assert!(covering.len() <= 500);
            for point in disk_points(&center, radius) {
                assert!(covering.covers(&point), "{:?} not covered", point);
            }
        }
    }

    #[test]
    fn test_cover_radius_across_antimeridian() {
        let planner = planner(QueryConfig::default());
        let center = GeoLocation::new(10.0, 179.995).unwrap();
        let covering = planner.cover_radius(&center, 2_000.0).unwrap();
        for point in disk_points(&center, 2_000.0) {
            assert!(covering.covers(&point));
        }
        let faces: BTreeSet<u8> = covering.cells().iter().map(|c| c.face()).collect();
        assert_eq!(faces.len(), 1);
    }

    #[test]
    fn test_cover_radius_at_pole() {
        let planner = planner(QueryConfig::default());
        let center = GeoLocation::new(90.0, 0.0).unwrap();
        let covering = planner.cover_radius(&center, 5_000.0).unwrap();
        for point in disk_points(&center, 5_000.0) {
            assert!(covering.covers(&point));
        }
    }

    #[test]
    fn test_cover_radius_across_face_seam() {
        let planner = planner(QueryConfig::default());
        let center = GeoLocation::new(0.0, 45.0).unwrap();
        let covering = planner.cover_radius(&center, 3_000.0).unwrap();
        let faces: BTreeSet<u8> = covering.cells().iter().map(|c| c.face()).collect();
        assert_eq!(faces, BTreeSet::from([0, 1]));
        for point in disk_points(&center, 3_000.0) {
            assert!(covering.covers(&point));
        }
    }

    #[test]
    fn test_covering_is_sorted_and_unique() {
        let planner = planner(QueryConfig::default());
        let center = GeoLocation::new(51.5074, -0.1278).unwrap();
        let covering = planner.cover_radius(&center, 2_000.0).unwrap();
        assert!(covering.cells().windows(2).all(|w| w[0] < w[1]));
        assert!(covering.cells().iter().all(|c| c.level() == covering.level()));
    }

    #[test]
    fn test_cap_is_enforced() {
        let planner = planner(QueryConfig::default().with_level(16).with_max_cells(10));
        let center = GeoLocation::new(40.0, -100.0).unwrap();
        let err = planner.cover_radius(&center, 5_000.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CoverageTooLarge);
        match err {
            GeoCellError::CoverageTooLarge {
                required,
                cap,
                level,
            } => {
                assert!(required > cap);
                assert_eq!(cap, 10);
                assert_eq!(level, 16);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_hopeless_region_fails_fast() {
        let planner = planner(QueryConfig::default().with_index_level(30).with_level(30));
        let err = planner.cover_bounds(&GeoBounds::full()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CoverageTooLarge);
    }

    #[test]
    fn test_cover_bounds() {
        let planner = planner(QueryConfig::default());
        let bounds = GeoBounds::new(40.70, 40.72, -74.02, -74.00);
        let covering = planner.cover_bounds(&bounds).unwrap();
        for lat in [40.70, 40.705, 40.71, 40.72] {
            for lon in [-74.02, -74.01, -74.00] {
                assert!(covering.covers(&GeoLocation::new(lat, lon).unwrap()));
            }
        }
        assert!(planner.cover_bounds(&GeoBounds::new(10.0, -10.0, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_invalid_radius() {
        let planner = planner(QueryConfig::default());
        let center = GeoLocation::new(0.0, 0.0).unwrap();
        assert_eq!(
            planner.cover_radius(&center, -1.0).unwrap_err().kind(),
            ErrorKind::Range
        );
    }
}
