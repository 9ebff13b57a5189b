//! Proximity queries over a [`RangeQuery`](crate::storage::RangeQuery) store.
//!
//! ```
//! use geocell::prelude::*;
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! # runtime.block_on(async {
//! let config = QueryConfig::default();
//! let store = MemoryCellStore::with_config(&config)?;
//! let ferry = GeoLocation::new(37.7955, -122.3937)?;
//! store.insert("places", "ferry", ferry, [("kind", "market")], "")?;
//!
//! let search = ProximitySearch::new(store, AttributeMapper, config)?;
//! let query = RadiusQuery::new("places", GeoLocation::new(37.7950, -122.3940)?, 500.0);
//! let result = search.search_radius(&query).await?;
//! assert_eq!(result.hits.len(), 1);
//! assert!(result.hits[0].distance < 100.0);
//! # Ok::<(), GeoCellError>(())
//! # }).unwrap();
//! ```

mod mapper;
mod search;

pub use mapper::{AttributeMapper, JsonMapper, Located, RecordMapper, StoredPoint};
pub use search::{BoundsQuery, Hit, ProximitySearch, RadiusQuery, SearchResult};
