//! Latitude/longitude bounding rectangles of cells.

use super::projection::{Vec3, cross, dot, face_uv_to_xyz, normalize, st_to_uv, xyz_to_lat_lon};
use super::{CellId, ij_to_st_corner};
use crate::types::GeoBounds;

/// Padding in degrees added on every side to absorb rounding.
const BOUNDS_GUARD_DEG: f64 = 1e-10;

/// Below this distance from the z axis a unit vector is treated as a pole.
const POLE_EPSILON: f64 = 1e-12;

impl CellId {
    /// Latitude/longitude rectangle enclosing the cell.
    ///
    /// Cell edges are great-circle arcs, so the latitude range includes any
    /// arc that bulges past its endpoints. Cells touching or enclosing a pole
    /// span every longitude. Cells crossing the antimeridian come back as a
    /// wrapping rectangle (`min_lon > max_lon`).
    ///
    /// ```
    /// use geocell::{CellId, GeoLocation};
    ///
    /// let here = GeoLocation::new(-33.8688, 151.2093)?;
    /// let bounds = CellId::from_location(&here, 10)?.bounds();
    /// assert!(bounds.contains(&here));
    /// assert!(bounds.max_lat - bounds.min_lat < 1.0);
    /// # Ok::<(), geocell::GeoCellError>(())
    /// ```
    pub fn bounds(self) -> GeoBounds {
        let (face, i, j) = self.face_ij();
        let size = CellId::size_ij(self.level()) as i64;
        let i0 = i as i64 & !(size - 1);
        let j0 = j as i64 & !(size - 1);
        let (s0, s1) = (ij_to_st_corner(i0), ij_to_st_corner(i0 + size));
        let (t0, t1) = (ij_to_st_corner(j0), ij_to_st_corner(j0 + size));

        // Counter-clockwise around the face normal.
        let corners = [(s0, t0), (s1, t0), (s1, t1), (s0, t1)]
            .map(|(s, t)| normalize(&face_uv_to_xyz(face, st_to_uv(s), st_to_uv(t))));
        quad_bounds(&corners)
    }
}

fn quad_bounds(corners: &[Vec3; 4]) -> GeoBounds {
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut lons = [0.0; 4];
    let mut touches_pole = false;

    for (k, corner) in corners.iter().enumerate() {
        let (lat, lon) = xyz_to_lat_lon(corner);
        min_lat = min_lat.min(lat);
        max_lat = max_lat.max(lat);
        lons[k] = lon;
        if corner[0].hypot(corner[1]) < POLE_EPSILON {
            touches_pole = true;
            if corner[2] > 0.0 {
                max_lat = 90.0;
            } else {
                min_lat = -90.0;
            }
        }
    }

    for k in 0..4 {
        let (low, high) = arc_lat_extremes(&corners[k], &corners[(k + 1) % 4]);
        if let Some(low) = low {
            min_lat = min_lat.min(low);
        }
        if let Some(high) = high {
            max_lat = max_lat.max(high);
        }
    }

    let min_lat = (min_lat - BOUNDS_GUARD_DEG).max(-90.0);
    let max_lat = (max_lat + BOUNDS_GUARD_DEG).min(90.0);
    if touches_pole {
        return GeoBounds::new(min_lat, max_lat, -180.0, 180.0);
    }

    // Walk the perimeter, unwrapping longitude as we go.
    let mut unwrapped = lons[0];
    let (mut low, mut high) = (unwrapped, unwrapped);
    for k in 0..4 {
        unwrapped += short_delta(lons[(k + 1) % 4] - lons[k]);
        low = low.min(unwrapped);
        high = high.max(unwrapped);
    }

    // A closed walk that does not return to its starting longitude winds
    // around a pole, and the cell then spans every longitude.
    if (unwrapped - lons[0]).abs() > 180.0 {
        let z_sum: f64 = corners.iter().map(|c| c[2]).sum();
        return if z_sum > 0.0 {
            GeoBounds::new(min_lat, 90.0, -180.0, 180.0)
        } else {
            GeoBounds::new(-90.0, max_lat, -180.0, 180.0)
        };
    }

    let mut min_lon = low - BOUNDS_GUARD_DEG;
    let mut max_lon = high + BOUNDS_GUARD_DEG;
    if max_lon - min_lon >= 360.0 {
        return GeoBounds::new(min_lat, max_lat, -180.0, 180.0);
    }
    let turns = ((min_lon + 180.0) / 360.0).floor();
    min_lon -= turns * 360.0;
    max_lon -= turns * 360.0;
    if max_lon > 180.0 {
        max_lon -= 360.0;
    }
    GeoBounds::new(min_lat, max_lat, min_lon, max_lon)
}

/// Longitude change in `(-180, 180]`.
fn short_delta(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta <= -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

/// Latitudes in degrees of the southernmost and northernmost points strictly
/// inside the minor great-circle arc from `a` to `b`, when those are interior
/// to the arc rather than at an endpoint.
fn arc_lat_extremes(a: &Vec3, b: &Vec3) -> (Option<f64>, Option<f64>) {
    let n = cross(a, b);
    let n_len = dot(&n, &n).sqrt();
    if n_len == 0.0 {
        return (None, None);
    }
    let n = [n[0] / n_len, n[1] / n_len, n[2] / n_len];

    // Point of the circle closest to +Z: z projected onto the circle's plane.
    let m = [-n[2] * n[0], -n[2] * n[1], 1.0 - n[2] * n[2]];
    if dot(&m, &m) < POLE_EPSILON * POLE_EPSILON {
        // The circle is the equator; the endpoints already bound it.
        return (None, None);
    }
    let m = normalize(&m);
    let south = [-m[0], -m[1], -m[2]];

    let on_arc = |p: &Vec3| dot(&cross(a, p), &n) > 0.0 && dot(&cross(p, b), &n) > 0.0;
    let high = on_arc(&m).then(|| m[2].asin().to_degrees());
    let low = on_arc(&south).then(|| south[2].asin().to_degrees());
    (low, high)
}
