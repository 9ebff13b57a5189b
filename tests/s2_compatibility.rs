//! Cell ids, tokens, hierarchy and neighbors agree with the `s2` crate.

use geocell::{CellId, GeoLocation, MAX_LEVEL, decode_bounds};
use s2::cellid::CellID;
use s2::latlng::LatLng;
use std::collections::BTreeSet;

const LEVELS: [u8; 9] = [0, 1, 2, 5, 10, 13, 16, 23, MAX_LEVEL];

/// Fibonacci lattice over the sphere plus poles, the antimeridian, cube
/// edges, and cube corners.
fn sample_points() -> Vec<(f64, f64)> {
    let n = 3_000;
    let golden = (1.0 + 5f64.sqrt()) / 2.0;
    let mut points: Vec<(f64, f64)> = (0..n)
        .map(|k| {
            let z = 1.0 - (2.0 * k as f64 + 1.0) / n as f64;
            let mut lon = (360.0 * k as f64 / golden) % 360.0;
            if lon > 180.0 {
                lon -= 360.0;
            }
            (z.asin().to_degrees(), lon)
        })
        .collect();

    let corner_lat = 35.264_389_682_754_654;
    points.extend([
        (90.0, 0.0),
        (-90.0, 0.0),
        (90.0, 123.4),
        (0.0, 180.0),
        (0.0, -180.0),
        (12.5, 179.999_999),
        (-12.5, -179.999_999),
        (0.0, 45.0),
        (0.0, -135.0),
        (45.0, 0.0),
        (-45.0, 90.0),
        (corner_lat, 45.0),
        (-corner_lat, -135.0),
        (corner_lat, -45.0),
        (37.7749, -122.4194),
    ]);
    points
}

fn reference(lat: f64, lon: f64, level: u8) -> CellID {
    CellID::from(LatLng::from_degrees(lat, lon)).parent(level as u64)
}

#[test]
fn test_ids_and_tokens_match_s2() {
    for (lat, lon) in sample_points() {
        for level in LEVELS {
            let cell = CellId::from_lat_lon(lat, lon, level).unwrap();
            let expected = reference(lat, lon, level);
            assert_eq!(cell.raw(), expected.0, "({}, {}) at level {}", lat, lon, level);
            assert_eq!(cell.to_token(), expected.to_token());
            assert_eq!(cell.level() as u64, expected.level());
            assert_eq!(cell.face(), expected.face());
            assert_eq!(CellId::from_token(&expected.to_token()).unwrap(), cell);
        }
    }
}

#[test]
fn test_hierarchy_matches_s2() {
    for (lat, lon) in sample_points() {
        for level in LEVELS {
            let cell = CellId::from_lat_lon(lat, lon, level).unwrap();
            let expected = reference(lat, lon, level);

            if level > 0 {
                assert_eq!(cell.parent().unwrap().raw(), expected.immediate_parent().0);
            }
            if level < MAX_LEVEL {
                let children: Vec<u64> =
                    cell.children().unwrap().iter().map(|c| c.raw()).collect();
                let expected_children: Vec<u64> =
                    expected.children().iter().map(|c| c.0).collect();
                assert_eq!(children, expected_children);
            }
            assert_eq!(cell.range_min().raw(), expected.range_min().0);
            assert_eq!(cell.range_max().raw(), expected.range_max().0);
        }
    }
}

#[test]
fn test_neighbors_match_s2() {
    for (lat, lon) in sample_points() {
        for level in LEVELS.into_iter().filter(|&level| level > 0) {
            let cell = CellId::from_lat_lon(lat, lon, level).unwrap();
            let expected_cell = reference(lat, lon, level);

            let ours: BTreeSet<u64> = cell.neighbors().iter().map(|n| n.raw()).collect();
            let expected: BTreeSet<u64> = expected_cell
                .all_neighbors(level as u64)
                .iter()
                .map(|n| n.0)
                .filter(|&raw| raw != expected_cell.0)
                .collect();
            assert_eq!(ours, expected, "neighbors of {} at ({}, {})", cell, lat, lon);

            let edges: BTreeSet<u64> = cell.edge_neighbors().iter().map(|n| n.raw()).collect();
            let expected_edges: BTreeSet<u64> =
                expected_cell.edge_neighbors().iter().map(|n| n.0).collect();
            assert_eq!(edges, expected_edges);
        }
    }
}

#[test]
fn test_s2_cells_decode_inside_bounds() {
    for (lat, lon) in sample_points().into_iter().step_by(7) {
        let location = GeoLocation::new(lat, lon).unwrap();
        for level in 0..=MAX_LEVEL {
            let cell = CellId::new(reference(lat, lon, level).0).unwrap();
            assert!(decode_bounds(cell).contains(&location));
            assert_eq!(CellId::from_location(&cell.to_location(), level).unwrap(), cell);
        }
    }
}
