//! Hierarchical spherical cell tokens and bounded proximity search over
//! sorted key-value stores.
//!
//! ```rust
//! use geocell::{CellId, GeoLocation};
//!
//! let nyc = GeoLocation::new(40.7128, -74.0060)?;
//! let cell = CellId::from_location(&nyc, 16)?;
//! let token = cell.to_token();
//! assert_eq!(CellId::from_token(&token)?, cell);
//! assert!(cell.bounds().contains(&nyc));
//! assert_eq!(cell.neighbors().len(), 8);
//! # Ok::<(), geocell::GeoCellError>(())
//! ```

pub mod cell;
pub mod compute;
pub mod config;
pub mod coverage;
pub mod error;
pub mod query;
pub mod storage;
pub mod types;

pub use cell::{
    CellId, MAX_LEVEL, cell_id_to_token, decode, decode_bounds, encode, encode_token,
    token_to_cell_id,
};
pub use compute::distance::{DistanceUnit, EARTH_RADIUS_METERS};
pub use config::QueryConfig;
pub use coverage::{CoveragePlanner, Covering};
pub use error::{BoxError, ErrorKind, GeoCellError, Result};
pub use query::{
    AttributeMapper, BoundsQuery, Hit, JsonMapper, Located, ProximitySearch, RadiusQuery,
    RecordMapper, SearchResult, StoredPoint,
};
pub use storage::{
    Cursor, Filter, MemoryCellStore, RangePage, RangeQuery, RangeRequest, RawRecord, StoreStats,
};
pub use types::{GeoBounds, GeoLocation};

pub use tokio_util::sync::CancellationToken;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CellId, GeoBounds, GeoCellError, GeoLocation, Result};

    pub use crate::{CoveragePlanner, DistanceUnit, QueryConfig};

    pub use crate::{
        AttributeMapper, BoundsQuery, JsonMapper, Located, ProximitySearch, RadiusQuery,
        RecordMapper,
    };

    pub use crate::{CancellationToken, MemoryCellStore, RangeQuery};

    pub use std::time::Duration;
}
