//! Range-query abstraction over sorted key-value stores.
//!
//! A store keeps records under the cell they were indexed at and answers
//! "every record whose cell lies in `[range_min, range_max]`" one page at a
//! time. Proximity search only talks to stores through [`RangeQuery`], so
//! any backend with ordered keys (or a secondary index on the cell token)
//! can sit behind it.

use crate::cell::CellId;
use crate::error::BoxError;
use crate::types::GeoLocation;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::future::Future;

mod memory;

pub use memory::MemoryCellStore;

/// Attribute holding the token of the cell a record was indexed at.
pub const CELL_ATTRIBUTE: &str = "cell";
/// Attribute holding the record's latitude.
pub const LAT_ATTRIBUTE: &str = "lat";
/// Attribute holding the record's longitude.
pub const LON_ATTRIBUTE: &str = "lon";

/// Trait for stores that can list the records of a cell.
///
/// Implementations return at most `request.limit` records per page and hand
/// back a cursor while more may remain. Errors are passed through to the
/// caller unchanged.
///
/// Stores come in two flavors. Range stores answer with every record whose
/// cell lies in `[range_min, range_max]`, so a coarse query cell reaches
/// records indexed at finer levels. Token stores only return records whose
/// [`CELL_ATTRIBUTE`] equals `request.token`; they report
/// `matches_descendants() == false` and searches then plan every covering
/// at the index level.
pub trait RangeQuery: Send + Sync {
    fn query_range(
        &self,
        request: RangeRequest<'_>,
    ) -> impl Future<Output = Result<RangePage, BoxError>> + Send;

    /// Whether a request for a cell also returns records indexed under its
    /// descendants.
    fn matches_descendants(&self) -> bool {
        true
    }
}

/// One page request for the records of a single cell.
#[derive(Debug, Clone)]
pub struct RangeRequest<'a> {
    /// Logical table or namespace.
    pub partition: &'a str,
    /// The queried cell; records of any descendant cell match.
    pub cell: CellId,
    /// `cell` as a token. Equal to the indexed cell attribute of matching
    /// records whenever the store does not match descendants.
    pub token: &'a str,
    /// Equality filters every returned record must satisfy.
    pub filters: &'a [Filter],
    /// Resume point from the previous page.
    pub cursor: Option<Cursor>,
    /// Maximum records in the page.
    pub limit: usize,
}

impl RangeRequest<'_> {
    pub fn range_min(&self) -> CellId {
        self.cell.range_min()
    }

    pub fn range_max(&self) -> CellId {
        self.cell.range_max()
    }
}

/// Attribute equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub attribute: String,
    pub value: String,
}

impl Filter {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, attributes: &BTreeMap<String, String>) -> bool {
        attributes.get(&self.attribute) == Some(&self.value)
    }
}

/// Opaque pagination token issued by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub Bytes);

#[derive(Debug, Clone, Default)]
pub struct RangePage {
    pub records: Vec<RawRecord>,
    /// Present while more records may follow.
    pub cursor: Option<Cursor>,
}

/// A record as stored: key, indexed cell, string attributes, and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub key: Bytes,
    pub cell: CellId,
    pub attributes: BTreeMap<String, String>,
    pub payload: Bytes,
}

/// Attributes written alongside every indexed record.
///
/// Coordinates are stored with `f64`'s shortest round-trip formatting, so
/// parsing them back yields the exact values.
pub fn storage_attributes(location: &GeoLocation, cell: CellId) -> [(String, String); 3] {
    [
        (CELL_ATTRIBUTE.to_string(), cell.to_token()),
        (LAT_ATTRIBUTE.to_string(), location.lat().to_string()),
        (LON_ATTRIBUTE.to_string(), location.lon().to_string()),
    ]
}

/// Range-query counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Records currently stored.
    pub record_count: usize,
    /// Pages served.
    pub queries: u64,
    /// Records returned across all pages.
    pub records_returned: u64,
}
