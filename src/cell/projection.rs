//! Sphere-to-cube projection and the quadratic ST/UV warp.
//!
//! Each of the six cube faces is described by a [`FaceFrame`]: its outward
//! normal and the directions of its local `u` and `v` axes. Every face-specific
//! formula (projection, inverse projection, face selection, and the wrap onto a
//! neighboring face) is derived from this one static table.

pub type Vec3 = [f64; 3];

/// Orientation of one cube face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFrame {
    pub normal: Vec3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

/// Face frames in face order. The order doubles as the tie-break priority for
/// face selection: +X, +Y, +Z, -X, -Y, -Z.
///
/// Resulting `(x, y, z)` per face: `(1, u, v)`, `(-u, 1, v)`, `(-u, -v, 1)`,
/// `(-1, -v, -u)`, `(v, -1, -u)`, `(v, u, -1)`.
pub static FACE_FRAMES: [FaceFrame; 6] = [
    FaceFrame {
        normal: [1.0, 0.0, 0.0],
        u_axis: [0.0, 1.0, 0.0],
        v_axis: [0.0, 0.0, 1.0],
    },
    FaceFrame {
        normal: [0.0, 1.0, 0.0],
        u_axis: [-1.0, 0.0, 0.0],
        v_axis: [0.0, 0.0, 1.0],
    },
    FaceFrame {
        normal: [0.0, 0.0, 1.0],
        u_axis: [-1.0, 0.0, 0.0],
        v_axis: [0.0, -1.0, 0.0],
    },
    FaceFrame {
        normal: [-1.0, 0.0, 0.0],
        u_axis: [0.0, 0.0, -1.0],
        v_axis: [0.0, -1.0, 0.0],
    },
    FaceFrame {
        normal: [0.0, -1.0, 0.0],
        u_axis: [0.0, 0.0, -1.0],
        v_axis: [1.0, 0.0, 0.0],
    },
    FaceFrame {
        normal: [0.0, 0.0, -1.0],
        u_axis: [0.0, 1.0, 0.0],
        v_axis: [1.0, 0.0, 0.0],
    },
];

#[inline]
pub(crate) fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub(crate) fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn normalize(v: &Vec3) -> Vec3 {
    let norm = dot(v, v).sqrt();
    if norm == 0.0 {
        return *v;
    }
    [v[0] / norm, v[1] / norm, v[2] / norm]
}

/// Unit vector for a latitude/longitude in degrees.
pub fn lat_lon_to_xyz(lat: f64, lon: f64) -> Vec3 {
    let phi = lat.to_radians();
    let theta = lon.to_radians();
    let cos_phi = phi.cos();
    [cos_phi * theta.cos(), cos_phi * theta.sin(), phi.sin()]
}

/// Latitude/longitude in degrees of a (not necessarily unit) vector.
pub fn xyz_to_lat_lon(p: &Vec3) -> (f64, f64) {
    let lat = p[2].atan2((p[0] * p[0] + p[1] * p[1]).sqrt());
    let lon = p[1].atan2(p[0]);
    (lat.to_degrees(), lon.to_degrees())
}

/// Face whose normal has the largest projection onto `p`; earlier faces win ties.
pub fn xyz_to_face(p: &Vec3) -> u8 {
    let mut best = 0u8;
    let mut best_dot = dot(p, &FACE_FRAMES[0].normal);
    for (face, frame) in FACE_FRAMES.iter().enumerate().skip(1) {
        let d = dot(p, &frame.normal);
        if d > best_dot {
            best = face as u8;
            best_dot = d;
        }
    }
    best
}

/// Point on the cube surface for face-local `(u, v)`. Not normalized.
pub fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Vec3 {
    let frame = &FACE_FRAMES[face as usize];
    [
        frame.normal[0] + u * frame.u_axis[0] + v * frame.v_axis[0],
        frame.normal[1] + u * frame.u_axis[1] + v * frame.v_axis[1],
        frame.normal[2] + u * frame.u_axis[2] + v * frame.v_axis[2],
    ]
}

/// Face-local `(u, v)` of `p` projected onto `face`.
///
/// `p` must lie in the half-space the face points into.
pub fn xyz_to_face_uv(face: u8, p: &Vec3) -> (f64, f64) {
    let frame = &FACE_FRAMES[face as usize];
    let w = dot(p, &frame.normal);
    (dot(p, &frame.u_axis) / w, dot(p, &frame.v_axis) / w)
}

/// Face selection followed by projection onto that face.
pub fn xyz_to_face_and_uv(p: &Vec3) -> (u8, f64, f64) {
    let face = xyz_to_face(p);
    let (u, v) = xyz_to_face_uv(face, p);
    (face, u, v)
}

/// Warp an ST coordinate in `[-1, 1]` to the linear UV coordinate.
#[inline]
pub fn st_to_uv(s: f64) -> f64 {
    if s >= 0.0 {
        ((1.0 + s) * (1.0 + s) - 1.0) / 3.0
    } else {
        (1.0 - (1.0 - s) * (1.0 - s)) / 3.0
    }
}

/// Inverse of [`st_to_uv`].
#[inline]
pub fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        (1.0 + 3.0 * u).sqrt() - 1.0
    } else {
        1.0 - (1.0 - 3.0 * u).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    #[test]
    fn test_lat_lon_to_xyz_is_unit() {
        for lat in (-90..=90).step_by(15) {
            for lon in (-180..=180).step_by(20) {
                let p = lat_lon_to_xyz(lat as f64, lon as f64);
                assert!((dot(&p, &p).sqrt() - 1.0).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_xyz_round_trip() {
        for &(lat, lon) in &[(37.7749, -122.4194), (-33.8688, 151.2093), (0.0, 179.5)] {
            let (lat2, lon2) = xyz_to_lat_lon(&lat_lon_to_xyz(lat, lon));
            assert!((lat - lat2).abs() < EPS);
            assert!((lon - lon2).abs() < EPS);
        }
    }

    #[test]
    fn test_face_selection() {
        assert_eq!(xyz_to_face(&lat_lon_to_xyz(0.0, 0.0)), 0);
        assert_eq!(xyz_to_face(&lat_lon_to_xyz(0.0, 90.0)), 1);
        assert_eq!(xyz_to_face(&lat_lon_to_xyz(90.0, 0.0)), 2);
        assert_eq!(xyz_to_face(&lat_lon_to_xyz(0.0, 180.0)), 3);
        assert_eq!(xyz_to_face(&lat_lon_to_xyz(0.0, -90.0)), 4);
        assert_eq!(xyz_to_face(&lat_lon_to_xyz(-90.0, 0.0)), 5);
    }

    #[test]
    fn test_face_tie_priority() {
        // +X and +Y tie: +X wins.
        assert_eq!(xyz_to_face(&[1.0, 1.0, 0.0]), 0);
        // +Y and -X tie: +Y comes first.
        assert_eq!(xyz_to_face(&[-1.0, 1.0, 0.0]), 1);
        // -X and -Y tie: -X comes first.
        assert_eq!(xyz_to_face(&[-1.0, -1.0, 0.0]), 3);
        // Cube corner: all three tie.
        assert_eq!(xyz_to_face(&[1.0, 1.0, 1.0]), 0);
    }

    #[test]
    fn test_face_formulas() {
        let (u, v) = (0.25, -0.5);
        assert_eq!(face_uv_to_xyz(0, u, v), [1.0, u, v]);
        assert_eq!(face_uv_to_xyz(1, u, v), [-u, 1.0, v]);
        assert_eq!(face_uv_to_xyz(2, u, v), [-u, -v, 1.0]);
        assert_eq!(face_uv_to_xyz(3, u, v), [-1.0, -v, -u]);
        assert_eq!(face_uv_to_xyz(4, u, v), [v, -1.0, -u]);
        assert_eq!(face_uv_to_xyz(5, u, v), [v, u, -1.0]);
    }

    #[test]
    fn test_face_uv_round_trip() {
        for face in 0..6u8 {
            for ui in -4..=4 {
                for vi in -4..=4 {
                    let (u, v) = (ui as f64 / 4.0, vi as f64 / 4.0);
                    let p = face_uv_to_xyz(face, u, v);
                    let (u2, v2) = xyz_to_face_uv(face, &p);
                    assert!((u - u2).abs() < EPS && (v - v2).abs() < EPS);

                    // Scaling onto the sphere does not change the projection.
                    let (u3, v3) = xyz_to_face_uv(face, &normalize(&p));
                    assert!((u - u3).abs() < EPS && (v - v3).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn test_face_centers_project_to_own_face() {
        for face in 0..6u8 {
            let center = face_uv_to_xyz(face, 0.0, 0.0);
            assert_eq!(center, FACE_FRAMES[face as usize].normal);
            assert_eq!(xyz_to_face(&center), face);
        }
    }

    #[test]
    fn test_frames_are_right_handed() {
        for frame in &FACE_FRAMES {
            assert_eq!(cross(&frame.u_axis, &frame.v_axis), frame.normal);
        }
    }

    #[test]
    fn test_st_uv_warp() {
        assert_eq!(st_to_uv(0.0), 0.0);
        assert_eq!(uv_to_st(0.0), 0.0);
        assert_eq!(st_to_uv(1.0), 1.0);
        assert_eq!(st_to_uv(-1.0), -1.0);
        assert_eq!(uv_to_st(1.0), 1.0);
        assert_eq!(uv_to_st(-1.0), -1.0);

        for i in -100..=100 {
            let s = i as f64 / 100.0;
            assert!((uv_to_st(st_to_uv(s)) - s).abs() < EPS);
            assert!((st_to_uv(uv_to_st(s)) - s).abs() < EPS);
        }
    }

    #[test]
    fn test_warp_is_monotonic() {
        let mut previous = st_to_uv(-1.0);
        for i in -99..=100 {
            let u = st_to_uv(i as f64 / 100.0);
            assert!(u > previous);
            previous = u;
        }
    }
}
