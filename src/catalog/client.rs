use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::error::CatalogError;
use crate::catalog::parsing::parse_catalog_response;
use crate::catalog::source::{CatalogQuery, CatalogSource, CelestrakSource};
use crate::catalog::types::{SatelliteGroup, TleRecord};

/// Timeout and retry behaviour for catalog requests.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one.
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Result of a by-id lookup: the ids that resolved and the ones that didn't.
#[derive(Debug, Clone, Default)]
pub struct CatalogBatch {
    pub records: Vec<TleRecord>,
    pub failures: Vec<(String, CatalogError)>,
}

#[derive(Clone)]
pub struct CatalogClient {
    source: Arc<dyn CatalogSource>,
    policy: FetchPolicy,
}

impl CatalogClient {
    pub fn new(source: Arc<dyn CatalogSource>, policy: FetchPolicy) -> Self {
        Self { source, policy }
    }

    pub fn celestrak(base_url: &str, policy: FetchPolicy) -> Result<Self, CatalogError> {
        let source = CelestrakSource::new(base_url, policy.timeout)?;
        Ok(Self::new(Arc::new(source), policy))
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch the current element set for a single catalog number.
    pub async fn fetch_one(&self, id: &str) -> Result<TleRecord, CatalogError> {
        let id = id.trim();
        if !is_catalog_number(id) {
            return Err(CatalogError::InvalidId(id.to_string()));
        }

        let query = CatalogQuery::CatalogNumber(id.to_string());
        let body = self.fetch_with_retry(&query).await?;
        let entry = parse_catalog_response(&body, &query.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(query.to_string()))?;

        let record = entry.into_record()?;
        if Some(record.norad_id) != id.parse().ok() {
            return Err(CatalogError::InvalidResponse(format!(
                "requested {} but catalog returned {}",
                id, record.norad_id
            )));
        }
        Ok(record)
    }

    /// One request per id (the catalog has no batched id lookup). Failing ids
    /// are reported in the batch instead of failing the whole call.
    pub async fn fetch_by_id(&self, ids: &[String]) -> CatalogBatch {
        let results = join_all(ids.iter().map(|id| async move {
            let result = self.fetch_one(id).await;
            (id.trim().to_string(), result)
        }))
        .await;

        let mut batch = CatalogBatch::default();
        for (id, result) in results {
            match result {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    log::warn!("Failed to fetch TLE for {}: {}", id, e);
                    batch.failures.push((id, e));
                }
            }
        }
        batch
    }

    /// Fetch up to `limit` element sets of a named group in one request.
    /// Entries with malformed lines are skipped.
    pub async fn fetch_by_group(
        &self,
        group: SatelliteGroup,
        limit: usize,
    ) -> Result<Vec<TleRecord>, CatalogError> {
        let query = CatalogQuery::Group(group);
        let body = self.fetch_with_retry(&query).await?;
        let entries = parse_catalog_response(&body, &query.to_string())?;
        let total = entries.len();

        let records: Vec<TleRecord> = entries
            .into_iter()
            .filter_map(|entry| match entry.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping entry in group {}: {}", group, e);
                    None
                }
            })
            .take(limit)
            .collect();

        log::info!(
            "Fetched {} of {} element sets for group {}",
            records.len(),
            total,
            group
        );
        Ok(records)
    }

    async fn fetch_with_retry(&self, query: &CatalogQuery) -> Result<String, CatalogError> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.policy.timeout, self.source.fetch(query)).await
            {
                Ok(result) => result,
                Err(_) => Err(CatalogError::Timeout),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff.saturating_mul(1u32 << attempt.min(16));
                    log::warn!(
                        "{} failed ({}), retrying in {:?} ({}/{})",
                        query,
                        e,
                        delay,
                        attempt + 1,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Catalog numbers are plain positive integers (up to 9 digits for Alpha-5
/// successors).
pub fn is_catalog_number(id: &str) -> bool {
    !id.is_empty() && id.len() <= 9 && id.bytes().all(|b| b.is_ascii_digit())
}
