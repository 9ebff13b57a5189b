//! Same-level neighbors, including across cube-face seams.

use super::projection::{face_uv_to_xyz, xyz_to_face_and_uv};
use super::{CellId, MAX_SIZE, st_to_ij};
use smallvec::SmallVec;

/// Offsets sharing an edge with the cell, in `(di, dj)` units of cell size.
const EDGE_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Edge offsets followed by the four diagonals.
const ALL_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (-1, -1),
    (1, -1),
    (1, 1),
    (-1, 1),
];

impl CellId {
    /// Distinct cells at the same level that touch this one along an edge or
    /// at a corner. Never contains the cell itself.
    ///
    /// Usually eight; fewer at the cube corners, where three faces meet, and
    /// at level 0, where the six faces are the only cells.
    ///
    /// ```
    /// use geocell::CellId;
    ///
    /// let cell = CellId::from_lat_lon(37.7749, -122.4194, 14)?;
    /// let neighbors = cell.neighbors();
    /// assert_eq!(neighbors.len(), 8);
    /// assert!(neighbors.iter().all(|n| n.level() == 14 && *n != cell));
    /// # Ok::<(), geocell::GeoCellError>(())
    /// ```
    pub fn neighbors(self) -> SmallVec<[CellId; 8]> {
        self.neighbors_at(&ALL_OFFSETS)
    }

    /// Distinct cells at the same level sharing an edge with this one.
    pub fn edge_neighbors(self) -> SmallVec<[CellId; 8]> {
        self.neighbors_at(&EDGE_OFFSETS)
    }

    fn neighbors_at(self, offsets: &[(i32, i32)]) -> SmallVec<[CellId; 8]> {
        let level = self.level();
        let size = CellId::size_ij(level);
        let (face, i, j) = self.face_ij();
        let (i0, j0) = (i & -size, j & -size);

        let mut out: SmallVec<[CellId; 8]> = SmallVec::new();
        for &(di, dj) in offsets {
            let (ni, nj) = (i0 + di * size, j0 + dj * size);
            let on_face = (0..MAX_SIZE).contains(&ni) && (0..MAX_SIZE).contains(&nj);
            let leaf = if on_face {
                CellId::from_face_ij(face, ni, nj)
            } else {
                from_face_ij_wrap(face, ni, nj)
            };
            let neighbor = leaf.parent_unchecked(level);
            if neighbor != self && !out.contains(&neighbor) {
                out.push(neighbor);
            }
        }
        out
    }
}

/// Leaf cell for `(i, j)` just beyond the edge of `face`, found by projecting
/// the point onto the adjacent face.
///
/// Coordinates are clamped to one leaf outside the face and mapped linearly
/// to `(u, v)`; the warp is the identity at the face edges, so the linear map
/// lands on the correct leaf row of the adjacent face.
fn from_face_ij_wrap(face: u8, i: i32, j: i32) -> CellId {
    let i = i.clamp(-1, MAX_SIZE);
    let j = j.clamp(-1, MAX_SIZE);

    // Keep the point strictly off the original face but never past the
    // neighbor's far edge.
    let limit = 1.0 + f64::EPSILON;
    let scale = 1.0 / MAX_SIZE as f64;
    let u = (scale * (2 * i as i64 + 1 - MAX_SIZE as i64) as f64).clamp(-limit, limit);
    let v = (scale * (2 * j as i64 + 1 - MAX_SIZE as i64) as f64).clamp(-limit, limit);

    let (face, u, v) = xyz_to_face_and_uv(&face_uv_to_xyz(face, u, v));
    CellId::from_face_ij(face, st_to_ij(u), st_to_ij(v))
}
