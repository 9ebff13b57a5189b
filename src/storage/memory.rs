//! In-memory cell store.

use super::{Cursor, RangePage, RangeQuery, RangeRequest, RawRecord, StoreStats};
use crate::cell::CellId;
use crate::compute::validation::validate_level;
use crate::config::QueryConfig;
use crate::error::{BoxError, GeoCellError, Result};
use crate::storage::storage_attributes;
use crate::types::GeoLocation;
use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::future::{Future, ready};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

/// Records of one partition, ordered by `(cell id, key)`.
#[derive(Default)]
struct Partition {
    records: BTreeMap<(u64, Bytes), RawRecord>,
    cells: FxHashMap<Bytes, CellId>,
}

/// In-memory store keyed by `(partition, cell, key)`.
///
/// Records are indexed at a fixed level; a range query for any coarser cell
/// is a single ordered scan over the cell's id range.
pub struct MemoryCellStore {
    index_level: u8,
    partitions: RwLock<FxHashMap<String, Partition>>,
    queries: AtomicU64,
    records_returned: AtomicU64,
}

impl MemoryCellStore {
    /// Create a store that indexes records at `index_level`.
    pub fn new(index_level: u8) -> Result<Self> {
        validate_level(index_level)?;
        Ok(Self {
            index_level,
            partitions: RwLock::new(FxHashMap::default()),
            queries: AtomicU64::new(0),
            records_returned: AtomicU64::new(0),
        })
    }

    /// Create a store matching a configuration's index level.
    pub fn with_config(config: &QueryConfig) -> Result<Self> {
        Self::new(config.index_level)
    }

    pub fn index_level(&self) -> u8 {
        self.index_level
    }

    /// Insert or replace a record at `location`, returning the cell it was
    /// indexed at.
    ///
    /// The cell token and coordinates are added to the record's attributes.
    pub fn insert<I, K, V>(
        &self,
        partition: &str,
        key: impl Into<Bytes>,
        location: GeoLocation,
        attributes: I,
        payload: impl Into<Bytes>,
    ) -> Result<CellId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let cell = CellId::from_location(&location, self.index_level)?;
        let mut stored: BTreeMap<String, String> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        stored.extend(storage_attributes(&location, cell));

        self.insert_record(
            partition,
            RawRecord {
                key: key.into(),
                cell,
                attributes: stored,
                payload: payload.into(),
            },
        )?;
        Ok(cell)
    }

    /// Insert or replace a prepared record as is.
    ///
    /// The record's cell must be at the store's index level.
    pub fn insert_record(&self, partition: &str, record: RawRecord) -> Result<()> {
        if record.cell.level() != self.index_level {
            return Err(GeoCellError::Precondition(format!(
                "record cell {} is at level {}, the store indexes level {}",
                record.cell,
                record.cell.level(),
                self.index_level
            )));
        }

        let mut partitions = self.partitions.write();
        let partition = partitions.entry(partition.to_string()).or_default();
        if let Some(old_cell) = partition.cells.insert(record.key.clone(), record.cell) {
            partition
                .records
                .remove(&(old_cell.raw(), record.key.clone()));
        }
        partition
            .records
            .insert((record.cell.raw(), record.key.clone()), record);
        Ok(())
    }

    /// Remove a record, returning it if it existed.
    pub fn remove(&self, partition: &str, key: &[u8]) -> Option<RawRecord> {
        let mut partitions = self.partitions.write();
        let partition = partitions.get_mut(partition)?;
        let cell = partition.cells.remove(key)?;
        partition
            .records
            .remove(&(cell.raw(), Bytes::copy_from_slice(key)))
    }

    pub fn get(&self, partition: &str, key: &[u8]) -> Option<RawRecord> {
        let partitions = self.partitions.read();
        let partition = partitions.get(partition)?;
        let cell = partition.cells.get(key)?;
        partition
            .records
            .get(&(cell.raw(), Bytes::copy_from_slice(key)))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.partitions
            .read()
            .values()
            .map(|p| p.records.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            record_count: self.len(),
            queries: self.queries.load(Ordering::Relaxed),
            records_returned: self.records_returned.load(Ordering::Relaxed),
        }
    }

    fn scan(&self, request: &RangeRequest<'_>) -> std::result::Result<RangePage, BoxError> {
        self.queries.fetch_add(1, Ordering::Relaxed);

        let end_key = (request.range_max().raw() + 1, Bytes::new());
        let start = match &request.cursor {
            Some(cursor) => {
                let resume = decode_cursor(cursor)?;
                if resume >= end_key {
                    return Ok(RangePage::default());
                }
                Bound::Excluded(resume)
            }
            None => Bound::Included((request.range_min().raw(), Bytes::new())),
        };
        let end = Bound::Excluded(end_key);
        let limit = request.limit.max(1);

        let partitions = self.partitions.read();
        let Some(partition) = partitions.get(request.partition) else {
            return Ok(RangePage::default());
        };

        let mut records = Vec::new();
        let mut last = None;
        for ((cell, key), record) in partition.records.range((start, end)) {
            if !request.filters.iter().all(|f| f.matches(&record.attributes)) {
                continue;
            }
            records.push(record.clone());
            if records.len() == limit {
                last = Some(encode_cursor(*cell, key));
                break;
            }
        }

        self.records_returned
            .fetch_add(records.len() as u64, Ordering::Relaxed);
        Ok(RangePage {
            records,
            cursor: last,
        })
    }
}

impl RangeQuery for MemoryCellStore {
    fn query_range(
        &self,
        request: RangeRequest<'_>,
    ) -> impl Future<Output = std::result::Result<RangePage, BoxError>> + Send {
        ready(self.scan(&request))
    }
}

/// Big-endian cell id followed by the key bytes.
fn encode_cursor(cell: u64, key: &Bytes) -> Cursor {
    let mut buf = BytesMut::with_capacity(8 + key.len());
    buf.put_u64(cell);
    buf.put_slice(key);
    Cursor(buf.freeze())
}

fn decode_cursor(cursor: &Cursor) -> std::result::Result<(u64, Bytes), BoxError> {
    let bytes = &cursor.0;
    if bytes.len() < 8 {
        return Err(Box::new(GeoCellError::invalid_format(
            "cursor",
            format!("expected at least 8 bytes, got {}", bytes.len()),
        )));
    }
    let mut cell = [0u8; 8];
    cell.copy_from_slice(&bytes[..8]);
    Ok((u64::from_be_bytes(cell), bytes.slice(8..)))
}
