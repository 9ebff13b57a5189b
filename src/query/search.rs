//! Proximity search: plan a covering, fan out range queries, post-filter.

use super::mapper::{Located, RecordMapper};
use crate::cell::CellId;
use crate::compute::validation::{validate_bounds, validate_radius};
use crate::config::QueryConfig;
use crate::coverage::{CoveragePlanner, Covering};
use crate::error::{GeoCellError, Result};
use crate::storage::{Filter, RangeQuery, RangeRequest, RawRecord};
use crate::types::{GeoBounds, GeoLocation};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use tokio_util::sync::CancellationToken;

/// Disk search around a center point.
#[derive(Debug, Clone)]
pub struct RadiusQuery {
    pub partition: String,
    pub center: GeoLocation,
    /// In the configured [`DistanceUnit`](crate::DistanceUnit).
    pub radius: f64,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl RadiusQuery {
    pub fn new(partition: impl Into<String>, center: GeoLocation, radius: f64) -> Self {
        Self {
            partition: partition.into(),
            center,
            radius,
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn with_filter(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::equals(attribute, value));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Rectangle search.
#[derive(Debug, Clone)]
pub struct BoundsQuery {
    pub partition: String,
    pub bounds: GeoBounds,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl BoundsQuery {
    pub fn new(partition: impl Into<String>, bounds: GeoBounds) -> Self {
        Self {
            partition: partition.into(),
            bounds,
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn with_filter(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::equals(attribute, value));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One matching item.
#[derive(Debug, Clone)]
pub struct Hit<T> {
    pub key: Bytes,
    pub item: T,
    pub location: GeoLocation,
    /// Cell the record was indexed under.
    pub cell: CellId,
    /// From the query center (the rectangle center for bounds searches), in
    /// the configured unit.
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// Ordered by distance, then key.
    pub hits: Vec<Hit<T>>,
    /// Range queries issued, one per covering cell.
    pub cells_queried: usize,
    pub level: u8,
}

impl<T> SearchResult<T> {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Bytes> {
        self.hits.iter().map(|hit| &hit.key)
    }
}

struct Candidate<T> {
    key: Bytes,
    cell: CellId,
    location: GeoLocation,
    item: T,
}

/// Runs radius and rectangle searches against a [`RangeQuery`] store.
///
/// A search plans its covering first and fails with
/// [`GeoCellError::CoverageTooLarge`] before touching the store when the
/// covering exceeds the cap. Range queries then run with bounded
/// concurrency; the first store or mapping error aborts the search and no
/// partial result is returned.
pub struct ProximitySearch<Q, M> {
    store: Q,
    mapper: M,
    planner: CoveragePlanner,
    config: QueryConfig,
}

impl<Q, M> ProximitySearch<Q, M>
where
    Q: RangeQuery,
    M: RecordMapper,
{
    pub fn new(store: Q, mapper: M, config: QueryConfig) -> Result<Self> {
        config.validate().map_err(GeoCellError::InvalidConfig)?;
        let mut planner = CoveragePlanner::new(&config);
        if !store.matches_descendants() {
            log::debug!(
                "store matches exact tokens only, planning at level {}",
                config.index_level
            );
            planner = planner.pinned_to_index_level();
        }
        Ok(Self {
            store,
            mapper,
            planner,
            config,
        })
    }

    pub fn store(&self) -> &Q {
        &self.store
    }

    pub fn planner(&self) -> &CoveragePlanner {
        &self.planner
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub async fn search_radius(&self, query: &RadiusQuery) -> Result<SearchResult<M::Item>> {
        self.search_radius_with_cancel(query, &CancellationToken::new())
            .await
    }

    pub async fn search_radius_with_cancel(
        &self,
        query: &RadiusQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResult<M::Item>> {
        let unit = self.config.unit;
        let radius_meters = unit.to_meters(query.radius);
        validate_radius(radius_meters)?;

        let covering = self.planner.cover_radius(&query.center, radius_meters)?;
        let candidates = self
            .fan_out(&query.partition, &covering, &query.filters, cancel)
            .await?;

        let hits = candidates
            .into_iter()
            .filter_map(|candidate| {
                let meters = candidate.location.haversine_distance(&query.center);
                (meters <= radius_meters).then(|| hit(candidate, unit.from_meters(meters)))
            })
            .collect();
        Ok(finish(hits, &covering, query.limit))
    }

    pub async fn search_bounds(&self, query: &BoundsQuery) -> Result<SearchResult<M::Item>> {
        self.search_bounds_with_cancel(query, &CancellationToken::new())
            .await
    }

    pub async fn search_bounds_with_cancel(
        &self,
        query: &BoundsQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResult<M::Item>> {
        validate_bounds(&query.bounds)?;
        let unit = self.config.unit;
        let center = query.bounds.center();

        let covering = self.planner.cover_bounds(&query.bounds)?;
        let candidates = self
            .fan_out(&query.partition, &covering, &query.filters, cancel)
            .await?;

        let hits = candidates
            .into_iter()
            .filter(|candidate| query.bounds.contains(&candidate.location))
            .map(|candidate| {
                let meters = candidate.location.haversine_distance(&center);
                hit(candidate, unit.from_meters(meters))
            })
            .collect();
        Ok(finish(hits, &covering, query.limit))
    }

    /// Query every covering cell, honoring the timeout and cancellation.
    async fn fan_out(
        &self,
        partition: &str,
        covering: &Covering,
        filters: &[Filter],
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate<M::Item>>> {
        log::debug!(
            "querying {} cells at level {} in partition {}",
            covering.len(),
            covering.level(),
            partition
        );

        let work = async {
            let per_cell: Vec<Vec<Candidate<M::Item>>> =
                stream::iter(covering.cells().iter().copied())
                    .map(|cell| self.fetch_cell(partition, cell, filters))
                    .buffer_unordered(self.config.concurrency)
                    .try_collect()
                    .await?;
            Ok::<_, GeoCellError>(per_cell.into_iter().flatten().collect::<Vec<_>>())
        };

        let bounded = async {
            match self.config.timeout() {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(result) => result,
                    Err(_) => {
                        log::warn!(
                            "search in partition {} timed out after {:?}",
                            partition,
                            limit
                        );
                        Err(GeoCellError::Timeout(limit))
                    }
                },
                None => work.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GeoCellError::Cancelled),
            result = bounded => result,
        }
    }

    /// Every page of one cell.
    async fn fetch_cell(
        &self,
        partition: &str,
        cell: CellId,
        filters: &[Filter],
    ) -> Result<Vec<Candidate<M::Item>>> {
        let token = cell.to_token();
        let mut candidates = Vec::new();
        let mut cursor = None;

        loop {
            let request = RangeRequest {
                partition,
                cell,
                token: &token,
                filters,
                cursor: cursor.take(),
                limit: self.config.page_size,
            };
            let page = self
                .store
                .query_range(request)
                .await
                .map_err(|source| GeoCellError::RangeQuery {
                    token: token.clone(),
                    source,
                })?;
            log::trace!("cell {} returned {} records", token, page.records.len());

            for record in &page.records {
                candidates.push(self.map(record)?);
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(candidates)
    }

    fn map(&self, record: &RawRecord) -> Result<Candidate<M::Item>> {
        let item = self
            .mapper
            .map_record(record)
            .map_err(|source| GeoCellError::RecordMapping {
                key: String::from_utf8_lossy(&record.key).into_owned(),
                source,
            })?;
        let location = item.location().unwrap_or_else(|| record.cell.to_location());
        Ok(Candidate {
            key: record.key.clone(),
            cell: record.cell,
            location,
            item,
        })
    }
}

fn hit<T>(candidate: Candidate<T>, distance: f64) -> Hit<T> {
    Hit {
        key: candidate.key,
        item: candidate.item,
        location: candidate.location,
        cell: candidate.cell,
        distance,
    }
}

fn finish<T>(mut hits: Vec<Hit<T>>, covering: &Covering, limit: Option<usize>) -> SearchResult<T> {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.key.cmp(&b.key)));
    if let Some(limit) = limit {
        hits.truncate(limit);
    }
    SearchResult {
        hits,
        cells_queried: covering.len(),
        level: covering.level(),
    }
}
