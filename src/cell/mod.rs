//! Hierarchical spherical cells.
//!
//! A point is projected onto one of six cube faces, warped so cells have
//! roughly equal area, quantized to a `2^30 x 2^30` leaf grid, and ordered
//! along a Hilbert curve. The resulting 64-bit [`CellId`] sorts cells so that
//! numerically close ids are usually spatially close, and a cell contains
//! exactly the ids in its `[range_min, range_max]` interval.
//!
//! ```
//! use geocell::cell::{decode, encode};
//! use geocell::GeoLocation;
//!
//! let sf = GeoLocation::new(37.7749, -122.4194)?;
//! let cell = encode(&sf, 16)?;
//! assert_eq!(cell.level(), 16);
//! assert!(cell.bounds().contains(&sf));
//!
//! let center = decode(cell);
//! assert_eq!(encode(&center, 16)?, cell);
//! # Ok::<(), geocell::GeoCellError>(())
//! ```

mod bounds;
mod cell_id;
mod hilbert;
mod neighbors;
pub mod projection;
mod token;

pub use cell_id::{CellId, ij_to_st_center, ij_to_st_corner, st_to_ij};
pub use token::{cell_id_to_token, token_to_cell_id};

use crate::error::Result;
use crate::types::{GeoBounds, GeoLocation};

/// Finest level: leaf cells.
pub const MAX_LEVEL: u8 = 30;

/// Number of leaf cells along one edge of a face.
pub const MAX_SIZE: i32 = 1 << MAX_LEVEL;

/// Cell of `location` at `level`.
pub fn encode(location: &GeoLocation, level: u8) -> Result<CellId> {
    CellId::from_location(location, level)
}

/// Token of the cell containing `(lat, lon)` at `level`.
///
/// ```
/// assert_eq!(geocell::cell::encode_token(0.0, 0.0, 1)?, "14");
/// # Ok::<(), geocell::GeoCellError>(())
/// ```
pub fn encode_token(lat: f64, lon: f64, level: u8) -> Result<String> {
    Ok(CellId::from_lat_lon(lat, lon, level)?.to_token())
}

/// Center of `cell`.
pub fn decode(cell: CellId) -> GeoLocation {
    cell.to_location()
}

/// Latitude/longitude rectangle enclosing `cell`.
pub fn decode_bounds(cell: CellId) -> GeoBounds {
    cell.bounds()
}
