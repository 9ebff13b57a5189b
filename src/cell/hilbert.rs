//! Hilbert-curve lookup tables for interleaving `(i, j)` into cell positions.
//!
//! The curve is processed `LOOKUP_BITS` levels at a time. `pos` maps
//! `(i, j, orientation)` to `(position, orientation)` and `ij` is its inverse.
//! Both tables are built once on first use.

use once_cell::sync::Lazy;

pub(crate) const LOOKUP_BITS: u32 = 4;

/// Orientation bit: the i and j axes are exchanged.
pub(crate) const SWAP_MASK: usize = 0x01;
/// Orientation bit: both axes are inverted.
pub(crate) const INVERT_MASK: usize = 0x02;

/// Child position (0..4) to the child's `(i << 1) | j` offset, per orientation.
pub(crate) const POS_TO_IJ: [[usize; 4]; 4] = [
    [0, 1, 3, 2], // canonical
    [0, 2, 3, 1], // swapped
    [3, 2, 0, 1], // inverted
    [3, 1, 0, 2], // swapped and inverted
];

/// Orientation change applied when descending into child `pos`.
pub(crate) const POS_TO_ORIENTATION: [usize; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

const TABLE_SIZE: usize = 1 << (2 * LOOKUP_BITS + 2);

pub(crate) struct LookupTables {
    /// Index: `(i << (LOOKUP_BITS + 2)) | (j << 2) | orientation`.
    /// Value: `(pos << 2) | orientation`.
    pub(crate) pos: [u16; TABLE_SIZE],
    /// Index: `(pos << 2) | orientation`.
    /// Value: `(i << (LOOKUP_BITS + 2)) | (j << 2) | orientation`.
    pub(crate) ij: [u16; TABLE_SIZE],
}

pub(crate) static LOOKUP: Lazy<LookupTables> = Lazy::new(LookupTables::build);

impl LookupTables {
    fn build() -> Self {
        let mut tables = LookupTables {
            pos: [0; TABLE_SIZE],
            ij: [0; TABLE_SIZE],
        };
        for orientation in [0, SWAP_MASK, INVERT_MASK, SWAP_MASK | INVERT_MASK] {
            tables.fill(0, 0, 0, orientation, 0, orientation);
        }
        tables
    }

    fn fill(
        &mut self,
        level: u32,
        i: usize,
        j: usize,
        orig_orientation: usize,
        pos: usize,
        orientation: usize,
    ) {
        if level == LOOKUP_BITS {
            let ij = (i << LOOKUP_BITS) + j;
            self.pos[(ij << 2) + orig_orientation] = ((pos << 2) + orientation) as u16;
            self.ij[(pos << 2) + orig_orientation] = ((ij << 2) + orientation) as u16;
            return;
        }

        let r = &POS_TO_IJ[orientation];
        for (child, &offset) in r.iter().enumerate() {
            self.fill(
                level + 1,
                (i << 1) + (offset >> 1),
                (j << 1) + (offset & 1),
                orig_orientation,
                (pos << 2) + child,
                orientation ^ POS_TO_ORIENTATION[child],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_and_ij_tables_are_inverse() {
        let tables = &*LOOKUP;
        for index in 0..TABLE_SIZE {
            let orientation = index & 3;
            let pos_entry = tables.pos[index] as usize;
            let back = tables.ij[(pos_entry & !3) | orientation] as usize;
            assert_eq!(back, index & !3 | (pos_entry & 3));
        }
    }

    #[test]
    fn test_canonical_curve_starts_at_origin() {
        // Position 0 in canonical orientation is the (0, 0) corner.
        let tables = &*LOOKUP;
        assert_eq!(tables.ij[0] >> 2, 0);
        // The last position of a canonical 16x16 block ends at i = 15, j = 0.
        let last = tables.ij[255 << 2] as usize;
        assert_eq!(last >> (LOOKUP_BITS as usize + 2), 15);
        assert_eq!((last >> 2) & 15, 0);
    }

    #[test]
    fn test_consecutive_positions_are_adjacent() {
        let tables = &*LOOKUP;
        for orientation in 0..4 {
            let mut previous: Option<(i32, i32)> = None;
            for pos in 0..256usize {
                let entry = tables.ij[(pos << 2) | orientation] as usize;
                let i = (entry >> (LOOKUP_BITS as usize + 2)) as i32;
                let j = ((entry >> 2) & 15) as i32;
                if let Some((pi, pj)) = previous {
                    assert_eq!((i - pi).abs() + (j - pj).abs(), 1);
                }
                previous = Some((i, j));
            }
        }
    }
}
