//! Settings for coverage planning and proximity search.
use crate::cell::MAX_LEVEL;
use crate::compute::distance::DistanceUnit;
use serde::de::Error;
use std::time::Duration;

/// Query configuration.
///
/// Unknown keys are rejected when deserializing, and every missing key falls
/// back to its default.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Level at which records are indexed. Queries never run at a finer level.
    #[serde(default = "QueryConfig::default_index_level")]
    pub index_level: u8,

    /// Fixed query level. When unset the level is derived from the radius.
    #[serde(default)]
    pub level: Option<u8>,

    /// Coarsest level the radius heuristic may pick.
    #[serde(default)]
    pub min_level: u8,

    /// Maximum number of cells (and therefore range queries) per search.
    #[serde(default = "QueryConfig::default_max_cells")]
    pub max_cells: usize,

    /// Target ratio of cell edge length to search radius.
    #[serde(default = "QueryConfig::default_cell_width_ratio")]
    pub cell_width_ratio: f64,

    /// Range queries in flight at once.
    #[serde(default = "QueryConfig::default_concurrency")]
    pub concurrency: usize,

    /// Records requested per page.
    #[serde(default = "QueryConfig::default_page_size")]
    pub page_size: usize,

    /// Deadline for a whole search, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Unit for radii and reported distances.
    #[serde(default)]
    pub unit: DistanceUnit,
}

impl QueryConfig {
    const fn default_index_level() -> u8 {
        16
    }

    const fn default_max_cells() -> usize {
        500
    }

    const fn default_cell_width_ratio() -> f64 {
        1.0
    }

    const fn default_concurrency() -> usize {
        8
    }

    const fn default_page_size() -> usize {
        100
    }

    pub fn with_index_level(mut self, level: u8) -> Self {
        self.index_level = level;
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_min_level(mut self, level: u8) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        if max_cells > 10_000 {
            log::warn!(
                "A cap of {} cells allows very large fan-outs; \
                every cell becomes one range query.",
                max_cells
            );
        }
        self.max_cells = max_cells;
        self
    }

    pub fn with_cell_width_ratio(mut self, ratio: f64) -> Self {
        self.cell_width_ratio = ratio;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Overall search timeout, rounded up to whole milliseconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn with_unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.index_level > MAX_LEVEL {
            return Err(format!(
                "Index level must be at most {}, got {}",
                MAX_LEVEL, self.index_level
            ));
        }

        if let Some(level) = self.level
            && level > self.index_level
        {
            return Err(format!(
                "Query level {} is finer than the index level {}",
                level, self.index_level
            ));
        }

        if self.min_level > self.index_level {
            return Err(format!(
                "Minimum level {} is finer than the index level {}",
                self.min_level, self.index_level
            ));
        }

        if self.max_cells == 0 {
            return Err("Max cells must be greater than zero".to_string());
        }

        if !self.cell_width_ratio.is_finite() || self.cell_width_ratio <= 0.0 {
            return Err(format!(
                "Cell width ratio must be positive and finite, got {}",
                self.cell_width_ratio
            ));
        }

        if self.concurrency == 0 {
            return Err("Concurrency must be greater than zero".to_string());
        }

        if self.page_size == 0 {
            return Err("Page size must be greater than zero".to_string());
        }

        if self.timeout_ms == Some(0) {
            return Err("Timeout must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: QueryConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: QueryConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            index_level: Self::default_index_level(),
            level: None,
            min_level: 0,
            max_cells: Self::default_max_cells(),
            cell_width_ratio: Self::default_cell_width_ratio(),
            concurrency: Self::default_concurrency(),
            page_size: Self::default_page_size(),
            timeout_ms: None,
            unit: DistanceUnit::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = QueryConfig::default();
        assert_eq!(config.index_level, 16);
        assert_eq!(config.level, None);
        assert_eq!(config.max_cells, 500);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.unit, DistanceUnit::Meters);
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = QueryConfig::default()
            .with_index_level(18)
            .with_level(12)
            .with_max_cells(64)
            .with_timeout(Duration::from_millis(250))
            .with_unit(DistanceUnit::Kilometers);

        let json = config.to_json().unwrap();
        let deserialized = QueryConfig::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
        assert_eq!(deserialized.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_timeout_rounds_up_to_millis() {
        let config = QueryConfig::default().with_timeout(Duration::from_micros(250));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1)));
        assert!(config.validate().is_ok());

        let config = QueryConfig::default().with_timeout(Duration::from_micros(1_500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(2)));

        assert!(QueryConfig::default().with_timeout(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = QueryConfig::from_json(r#"{ "max_cells": 20, "unit": "miles" }"#).unwrap();
        assert_eq!(config.max_cells, 20);
        assert_eq!(config.unit, DistanceUnit::Miles);
        assert_eq!(config.index_level, 16);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(QueryConfig::from_json(r#"{ "max_cell": 20 }"#).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(QueryConfig::default().with_index_level(31).validate().is_err());
        assert!(QueryConfig::default().with_level(17).validate().is_err());
        assert!(QueryConfig::default().with_min_level(20).validate().is_err());
        assert!(QueryConfig::default().with_max_cells(0).validate().is_err());
        assert!(QueryConfig::default().with_concurrency(0).validate().is_err());
        assert!(QueryConfig::default().with_page_size(0).validate().is_err());
        assert!(
            QueryConfig::default()
                .with_cell_width_ratio(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(QueryConfig::from_json(r#"{ "level": 20 }"#).is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_round_trip() {
        let config = QueryConfig::default().with_level(10).with_page_size(25);
        let text = config.to_toml().unwrap();
        assert_eq!(QueryConfig::from_toml(&text).unwrap(), config);
    }
}
