use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::catalog::{
    is_catalog_number, CatalogClient, CatalogError, SatelliteGroup, Source, TleRecord,
};
use crate::config::{Config, ConfigError};
use crate::predict::{check_horizon, predict, propagate_one, GroundStation, OrbitPrediction};
use crate::service::error::ServiceError;
use crate::service::fallback::{
    fallback_position, fallback_record, reference_record, FallbackPolicy, GroupFallback,
    IdFallback,
};
use crate::service::types::{PositionBatch, SatelliteFailure};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub fallback: FallbackPolicy,
    pub prediction_interval: chrono::Duration,
    /// Observer for look angles and pass windows. Positions carry look
    /// angles only when set; predictions fall back to the origin station.
    pub station: Option<GroundStation>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 256,
            fallback: FallbackPolicy::default(),
            prediction_interval: chrono::Duration::minutes(10),
            station: None,
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            cache_ttl: config.cache.ttl,
            cache_capacity: config.cache.capacity,
            fallback: config.fallback,
            prediction_interval: config.prediction_interval()?,
            station: config.station()?,
        })
    }
}

struct Caches {
    tles: TtlCache<TleRecord>,
    groups: TtlCache<Vec<TleRecord>>,
    positions: TtlCache<PositionBatch>,
    predictions: TtlCache<OrbitPrediction>,
}

/// Answers "where is satellite X now" and "where will it be" from catalog
/// element sets, caching live answers and applying the fallback policy when
/// the catalog is unreachable.
pub struct OrbitalStateService {
    catalog: CatalogClient,
    settings: ServiceSettings,
    caches: Caches,
}

impl OrbitalStateService {
    pub fn new(catalog: CatalogClient, settings: ServiceSettings, clock: Arc<dyn Clock>) -> Self {
        let (ttl, capacity) = (settings.cache_ttl, settings.cache_capacity);
        let caches = Caches {
            tles: TtlCache::new(ttl, capacity, clock.clone()),
            groups: TtlCache::new(ttl, capacity, clock.clone()),
            positions: TtlCache::new(ttl, capacity, clock.clone()),
            predictions: TtlCache::new(ttl, capacity, clock),
        };
        Self {
            catalog,
            settings,
            caches,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let catalog = CatalogClient::celestrak(&config.catalog.base_url, config.fetch_policy())
            .map_err(|e| ConfigError::Invalid(format!("catalog client: {}", e)))?;
        let settings = ServiceSettings::from_config(config)?;
        Ok(Self::new(catalog, settings, Arc::new(SystemClock)))
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Current element set for one id, from cache when fresh.
    pub async fn tle(&self, id: &str) -> Result<TleRecord, ServiceError> {
        let id = canonical_id(id);
        let result = self
            .caches
            .tles
            .get_or_try_compute(&id, || self.catalog.fetch_one(&id))
            .await;

        match result {
            Ok(record) => Ok(record),
            Err(e) if self.falls_back_for_id(&e) => {
                log::warn!("Catalog unreachable for {} ({}), using fallback elements", id, e);
                Ok(fallback_record(&id)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Positions of `ids` right now. Whole batches are cached by id list.
    pub async fn current_positions(&self, ids: &[String]) -> PositionBatch {
        let key = ids.iter().map(|id| canonical_id(id)).collect::<Vec<_>>().join(",");
        if let Some(batch) = self.caches.positions.get(&key) {
            log::debug!("cache hit: positions {}", key);
            return batch;
        }

        let batch = self.positions_at(ids, Utc::now()).await;
        if !batch.is_degraded() {
            self.caches.positions.insert(key, batch.clone());
        }
        batch
    }

    /// Positions of `ids` at `at`, in request order. One id failing never
    /// affects the others.
    pub async fn positions_at(&self, ids: &[String], at: DateTime<Utc>) -> PositionBatch {
        let resolved = self.resolve_tles(ids).await;
        let station = self.settings.station.as_ref();

        let mut batch = PositionBatch::default();
        for (id, result) in resolved {
            match result {
                Ok(tle) => match propagate_one(&tle, at, station) {
                    Ok(position) => batch.positions.push(position),
                    Err(e) => {
                        log::warn!("Propagation failed for {}: {}", id, e);
                        batch.failures.push(SatelliteFailure::from_predict(&id, &e));
                    }
                },
                Err(e) if self.falls_back_for_id(&e) => match fallback_position(&id, at) {
                    Ok(position) => batch.positions.push(position),
                    Err(fallback_err) => {
                        batch.failures.push(SatelliteFailure::from_catalog(&id, &fallback_err))
                    }
                },
                Err(e) => batch.failures.push(SatelliteFailure::from_catalog(&id, &e)),
            }
        }

        log::info!(
            "Resolved {} positions ({} fallback, {} failed)",
            batch.positions.len(),
            batch
                .positions
                .iter()
                .filter(|p| p.source == Source::Fallback)
                .count(),
            batch.failures.len()
        );
        batch
    }

    /// Up to `limit` element sets of `group`. An unreachable catalog yields
    /// the configured group fallback, never an error.
    pub async fn group_listing(&self, group: SatelliteGroup, limit: usize) -> Vec<TleRecord> {
        let key = format!("{}:{}", group, limit);
        let result = self
            .caches
            .groups
            .get_or_try_compute(&key, || async {
                let records = self.catalog.fetch_by_group(group, limit).await?;
                for record in &records {
                    self.caches.tles.insert(record.satellite_id(), record.clone());
                }
                Ok::<_, CatalogError>(records)
            })
            .await;

        match result {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Group {} unavailable: {}", group, e);
                match self.settings.fallback.by_group {
                    GroupFallback::Empty => Vec::new(),
                    GroupFallback::Synthetic => match reference_record() {
                        Ok(record) => vec![record],
                        Err(e) => {
                            log::error!("Reference elements unusable: {}", e);
                            Vec::new()
                        }
                    },
                }
            }
        }
    }

    /// Prediction over `hours` starting now. Live predictions are cached
    /// by id and horizon.
    pub async fn predict(&self, id: &str, hours: f64) -> Result<OrbitPrediction, ServiceError> {
        check_horizon(hours)?;
        let key = format!("{}:{}", canonical_id(id), hours);
        if let Some(prediction) = self.caches.predictions.get(&key) {
            log::debug!("cache hit: prediction {}", key);
            return Ok(prediction);
        }

        let prediction = self.predict_from(id, hours, Utc::now()).await?;
        if prediction.source == Source::Live {
            self.caches.predictions.insert(key, prediction.clone());
        }
        Ok(prediction)
    }

    pub async fn predict_from(
        &self,
        id: &str,
        hours: f64,
        start: DateTime<Utc>,
    ) -> Result<OrbitPrediction, ServiceError> {
        check_horizon(hours)?;
        let tle = self.tle(id).await?;
        let station = self.settings.station.unwrap_or_default();
        Ok(predict(
            &tle,
            hours,
            start,
            self.settings.prediction_interval,
            &station,
        )?)
    }

    fn falls_back_for_id(&self, err: &CatalogError) -> bool {
        err.is_unreachable() && self.settings.fallback.by_id == IdFallback::Synthetic
    }

    /// Element sets for `ids` in request order, fetching only the ids that
    /// are not cached (each at most once).
    async fn resolve_tles(&self, ids: &[String]) -> Vec<(String, Result<TleRecord, CatalogError>)> {
        let ids: Vec<String> = ids.iter().map(|id| canonical_id(id)).collect();

        let mut resolved: HashMap<String, Result<TleRecord, CatalogError>> = HashMap::new();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();
        for id in &ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            match self.caches.tles.get(id) {
                Some(record) => {
                    resolved.insert(id.clone(), Ok(record));
                }
                None => misses.push(id.clone()),
            }
        }

        if !misses.is_empty() {
            log::debug!("Fetching {} uncached element sets", misses.len());
            let batch = self.catalog.fetch_by_id(&misses).await;
            for record in batch.records {
                let id = record.satellite_id();
                self.caches.tles.insert(id.clone(), record.clone());
                resolved.insert(id, Ok(record));
            }
            for (id, e) in batch.failures {
                resolved.insert(canonical_id(&id), Err(e));
            }
        }

        ids.into_iter()
            .map(|id| {
                let result = resolved
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| Err(CatalogError::NotFound(id.clone())));
                (id, result)
            })
            .collect()
    }
}

/// Catalog numbers lose leading zeros so "025544" and "25544" share cache
/// entries. Anything else is only trimmed and fails validation later.
fn canonical_id(id: &str) -> String {
    let id = id.trim();
    if is_catalog_number(id) {
        if let Ok(n) = id.parse::<u64>() {
            return n.to_string();
        }
    }
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ids() {
        assert_eq!(canonical_id(" 25544 "), "25544");
        assert_eq!(canonical_id("025544"), "25544");
        assert_eq!(canonical_id("ISS"), "ISS");
        assert_eq!(canonical_id(""), "");
    }

    #[test]
    fn settings_follow_config() {
        let config = Config::from_yaml(
            "cache:\n  ttl: 2m\nfallback:\n  by_id: omit\nstation:\n  coordinates: \"10, 20\"\n",
        )
        .unwrap();
        let settings = ServiceSettings::from_config(&config).unwrap();
        assert_eq!(settings.cache_ttl, Duration::from_secs(120));
        assert_eq!(settings.fallback.by_id, IdFallback::Omit);
        assert_eq!(settings.station.unwrap().longitude_deg, 20.0);
        assert_eq!(settings.prediction_interval, chrono::Duration::minutes(10));
    }
}
