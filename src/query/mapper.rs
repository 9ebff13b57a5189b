//! Turning raw records into caller items.

use crate::error::BoxError;
use crate::storage::{LAT_ATTRIBUTE, LON_ATTRIBUTE, RawRecord};
use crate::types::GeoLocation;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Items that may know their own coordinates.
///
/// Items returning `None` are placed at the center of the cell their record
/// was indexed under.
pub trait Located {
    fn location(&self) -> Option<GeoLocation>;
}

/// Maps each raw record to a caller-defined item.
pub trait RecordMapper: Send + Sync {
    type Item: Located;

    fn map_record(&self, record: &RawRecord) -> Result<Self::Item, BoxError>;
}

/// A record with coordinates read from its `lat`/`lon` attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub key: Bytes,
    pub location: Option<GeoLocation>,
    pub attributes: BTreeMap<String, String>,
    pub payload: Bytes,
}

impl Located for StoredPoint {
    fn location(&self) -> Option<GeoLocation> {
        self.location
    }
}

/// Mapper for records written by [`MemoryCellStore::insert`] or any store
/// that keeps [`storage_attributes`].
///
/// Records without both coordinates map to a point without a location.
///
/// [`MemoryCellStore::insert`]: crate::storage::MemoryCellStore::insert
/// [`storage_attributes`]: crate::storage::storage_attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeMapper;

impl RecordMapper for AttributeMapper {
    type Item = StoredPoint;

    fn map_record(&self, record: &RawRecord) -> Result<StoredPoint, BoxError> {
        let location = match (
            record.attributes.get(LAT_ATTRIBUTE),
            record.attributes.get(LON_ATTRIBUTE),
        ) {
            (Some(lat), Some(lon)) => Some(GeoLocation::new(lat.parse()?, lon.parse()?)?),
            _ => None,
        };
        Ok(StoredPoint {
            key: record.key.clone(),
            location,
            attributes: record.attributes.clone(),
            payload: record.payload.clone(),
        })
    }
}

/// Mapper that deserializes the payload as JSON.
pub struct JsonMapper<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonMapper<T> {
    pub fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for JsonMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordMapper for JsonMapper<T>
where
    T: DeserializeOwned + Located,
{
    type Item = T;

    fn map_record(&self, record: &RawRecord) -> Result<T, BoxError> {
        Ok(serde_json::from_slice(&record.payload)?)
    }
}
