use super::hilbert::{INVERT_MASK, LOOKUP, LOOKUP_BITS, SWAP_MASK};
use super::projection::{
    face_uv_to_xyz, lat_lon_to_xyz, st_to_uv, uv_to_st, xyz_to_face_and_uv, xyz_to_lat_lon, Vec3,
};
use super::{MAX_LEVEL, MAX_SIZE};
use crate::compute::validation::{validate_lat_lon, validate_level};
use crate::error::{GeoCellError, Result};
use crate::types::GeoLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bits used for the face number.
const FACE_BITS: u32 = 3;
/// Bits below the face number: two per level plus the sentinel.
const POS_BITS: u32 = 64 - FACE_BITS;
/// Set where the lowest set bit of a valid id may sit (even bit positions).
const LSB_POSITIONS: u64 = 0x1555_5555_5555_5555;

/// A cell on the sphere.
///
/// Bit layout, most significant first: 3 bits of face, `2 * level` bits of
/// Hilbert position, a single `1` sentinel, then zeros. Every value of this
/// type is a valid id; raw integers go through [`CellId::new`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellId(u64);

impl CellId {
    /// Wrap a raw 64-bit id after checking it is well formed.
    pub fn new(raw: u64) -> Result<Self> {
        let lsb = raw & raw.wrapping_neg();
        if raw >> POS_BITS > 5 || lsb & LSB_POSITIONS == 0 {
            return Err(GeoCellError::invalid_format(
                "cell id",
                format!("{:#018x} is not a valid cell id", raw),
            ));
        }
        Ok(Self(raw))
    }

    /// The level-0 cell covering a whole face.
    pub fn from_face(face: u8) -> Result<Self> {
        check_face(face)?;
        Ok(Self((face as u64) << POS_BITS | lsb_for_level(0)))
    }

    /// Cell at `level` containing `location`.
    pub fn from_location(location: &GeoLocation, level: u8) -> Result<Self> {
        Self::from_lat_lon(location.lat(), location.lon(), level)
    }

    /// Cell at `level` containing `(lat, lon)`, in degrees.
    ///
    /// ```
    /// use geocell::CellId;
    ///
    /// let leaf = CellId::from_lat_lon(0.0, 0.0, 30)?;
    /// assert_eq!(leaf.raw(), 0x1000_0000_0000_0001);
    /// assert_eq!(CellId::from_lat_lon(90.0, 0.0, 0)?.face(), 2);
    /// # Ok::<(), geocell::GeoCellError>(())
    /// ```
    pub fn from_lat_lon(lat: f64, lon: f64, level: u8) -> Result<Self> {
        validate_lat_lon(lat, lon)?;
        validate_level(level)?;
        Ok(Self::from_point(&lat_lon_to_xyz(lat, lon)).parent_unchecked(level))
    }

    /// Cell at `level` containing leaf coordinates `(i, j)` of `face`.
    pub fn from_face_ij_level(face: u8, i: i32, j: i32, level: u8) -> Result<Self> {
        check_face(face)?;
        validate_level(level)?;
        for (parameter, value) in [("i", i), ("j", j)] {
            if !(0..MAX_SIZE).contains(&value) {
                return Err(GeoCellError::out_of_range(
                    parameter,
                    format!("expected 0..{}, got {}", MAX_SIZE, value),
                ));
            }
        }
        Ok(Self::from_face_ij(face, i, j).parent_unchecked(level))
    }

    /// Leaf cell containing a (not necessarily unit) point.
    pub(crate) fn from_point(p: &Vec3) -> Self {
        let (face, u, v) = xyz_to_face_and_uv(p);
        Self::from_face_ij(face, st_to_ij(uv_to_st(u)), st_to_ij(uv_to_st(v)))
    }

    /// Leaf cell at `(i, j)`; both must be in `0..MAX_SIZE`.
    pub(crate) fn from_face_ij(face: u8, i: i32, j: i32) -> Self {
        let tables = &*LOOKUP;
        // Shifted left by one at the end to make room for the sentinel.
        let mut n = (face as u64) << (POS_BITS - 1);
        let mut bits = face as usize & SWAP_MASK;
        let mask = (1 << LOOKUP_BITS) - 1;

        for k in (0..8u32).rev() {
            bits += (((i >> (k * LOOKUP_BITS)) & mask) as usize) << (LOOKUP_BITS + 2);
            bits += (((j >> (k * LOOKUP_BITS)) & mask) as usize) << 2;
            bits = tables.pos[bits] as usize;
            n |= ((bits >> 2) as u64) << (k * 2 * LOOKUP_BITS);
            bits &= SWAP_MASK | INVERT_MASK;
        }

        Self(n * 2 + 1)
    }

    /// Face and the `(i, j)` of a leaf cell inside this cell.
    pub fn face_ij(self) -> (u8, i32, i32) {
        let tables = &*LOOKUP;
        let face = self.face();
        let mut bits = face as usize & SWAP_MASK;
        let (mut i, mut j) = (0i32, 0i32);

        for k in (0..8u32).rev() {
            // The top chunk only carries the remaining two levels.
            let nbits = if k == 7 {
                MAX_LEVEL as u32 - 7 * LOOKUP_BITS
            } else {
                LOOKUP_BITS
            };
            let chunk = (self.0 >> (k * 2 * LOOKUP_BITS + 1)) as usize & ((1 << (2 * nbits)) - 1);
            bits += chunk << 2;
            bits = tables.ij[bits] as usize;
            i += ((bits >> (LOOKUP_BITS + 2)) as i32) << (k * LOOKUP_BITS);
            j += (((bits >> 2) & ((1 << LOOKUP_BITS) - 1)) as i32) << (k * LOOKUP_BITS);
            bits &= SWAP_MASK | INVERT_MASK;
        }

        (face, i, j)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn face(self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// Lowest set bit: the sentinel.
    #[inline]
    pub fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    #[inline]
    pub fn level(self) -> u8 {
        MAX_LEVEL - (self.0.trailing_zeros() / 2) as u8
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.0 & 1 != 0
    }

    #[inline]
    pub fn is_face(self) -> bool {
        self.level() == 0
    }

    /// Smallest leaf id contained in this cell.
    pub fn range_min(self) -> CellId {
        CellId(self.0 - (self.lsb() - 1))
    }

    /// Largest leaf id contained in this cell.
    pub fn range_max(self) -> CellId {
        CellId(self.0 + (self.lsb() - 1))
    }

    /// True when `other` is this cell or one of its descendants.
    pub fn contains(self, other: CellId) -> bool {
        self.range_min() <= other && other <= self.range_max()
    }

    pub fn intersects(self, other: CellId) -> bool {
        other.range_min() <= self.range_max() && other.range_max() >= self.range_min()
    }

    /// The immediate parent.
    pub fn parent(self) -> Result<CellId> {
        if self.is_face() {
            return Err(GeoCellError::Precondition(format!(
                "face cell {} has no parent",
                self.to_token()
            )));
        }
        Ok(self.parent_unchecked(self.level() - 1))
    }

    /// Ancestor at `level`; `level` must not be finer than the cell itself.
    ///
    /// ```
    /// use geocell::CellId;
    ///
    /// let leaf = CellId::from_lat_lon(48.8566, 2.3522, 30)?;
    /// let city = leaf.parent_at(12)?;
    /// assert_eq!(city.level(), 12);
    /// assert!(city.contains(leaf));
    /// assert!(leaf.parent_at(31).is_err());
    /// # Ok::<(), geocell::GeoCellError>(())
    /// ```
    pub fn parent_at(self, level: u8) -> Result<CellId> {
        validate_level(level)?;
        if level > self.level() {
            return Err(GeoCellError::Precondition(format!(
                "cell {} is at level {}, cannot take its ancestor at level {}",
                self.to_token(),
                self.level(),
                level
            )));
        }
        Ok(self.parent_unchecked(level))
    }

    #[inline]
    pub(crate) fn parent_unchecked(self, level: u8) -> CellId {
        let lsb = lsb_for_level(level);
        CellId((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// The four children in Hilbert order.
    pub fn children(self) -> Result<[CellId; 4]> {
        if self.is_leaf() {
            return Err(GeoCellError::Precondition(format!(
                "leaf cell {} has no children",
                self.to_token()
            )));
        }
        let lsb = self.lsb();
        let child_lsb = lsb >> 2;
        let first = self.0 - lsb + child_lsb;
        Ok([0, 1, 2, 3].map(|k| CellId(first + k * (child_lsb << 1))))
    }

    /// Center of the cell in `(s, t)`.
    pub fn center_st(self) -> (f64, f64) {
        let (_, i, j) = self.face_ij();
        let level = self.level();
        (ij_to_st_center(i, level), ij_to_st_center(j, level))
    }

    /// Center of the cell.
    pub fn to_location(self) -> GeoLocation {
        let (s, t) = self.center_st();
        let p = face_uv_to_xyz(self.face(), st_to_uv(s), st_to_uv(t));
        let (lat, lon) = xyz_to_lat_lon(&p);
        GeoLocation::clamped(lat, lon)
    }

    /// Number of leaf cells along one edge of a cell at `level`.
    #[inline]
    pub fn size_ij(level: u8) -> i32 {
        1 << (MAX_LEVEL - level)
    }
}

#[inline]
pub(crate) fn lsb_for_level(level: u8) -> u64 {
    1 << (2 * (MAX_LEVEL - level) as u32)
}

fn check_face(face: u8) -> Result<()> {
    if face > 5 {
        return Err(GeoCellError::out_of_range(
            "face",
            format!("expected 0..=5, got {}", face),
        ));
    }
    Ok(())
}

/// Leaf coordinate of `s` in `[-1, 1]`, clamped to the face.
pub fn st_to_ij(s: f64) -> i32 {
    let i = ((s + 1.0) * 0.5 * MAX_SIZE as f64).floor();
    i.clamp(0.0, (MAX_SIZE - 1) as f64) as i32
}

/// `s` at the center of the level-`level` cell containing leaf coordinate `i`.
///
/// ```
/// use geocell::cell::ij_to_st_center;
///
/// // The face itself is centered on s = 0.
/// assert_eq!(ij_to_st_center(12_345, 0), 0.0);
/// assert_eq!(ij_to_st_center(0, 1), -0.5);
/// ```
pub fn ij_to_st_center(i: i32, level: u8) -> f64 {
    let size = CellId::size_ij(level) as i64;
    let corner = i as i64 & !(size - 1);
    // Twice-resolution coordinate of the center, in [0, 2 * MAX_SIZE].
    let si = 2 * corner + size;
    si as f64 / MAX_SIZE as f64 - 1.0
}

/// `s` at leaf-grid line `i`, for `i` in `0..=MAX_SIZE`.
pub fn ij_to_st_corner(i: i64) -> f64 {
    2.0 * i as f64 / MAX_SIZE as f64 - 1.0
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({}/{})", self.to_token(), self.level())
    }
}

impl From<CellId> for u64 {
    fn from(cell: CellId) -> Self {
        cell.0
    }
}

impl TryFrom<u64> for CellId {
    type Error = GeoCellError;

    fn try_from(raw: u64) -> Result<Self> {
        CellId::new(raw)
    }
}
