use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orbstate::cache::ManualClock;
use orbstate::catalog::parsing::checksum;
use orbstate::catalog::{
    CatalogClient, CatalogError, CatalogQuery, CatalogSource, FetchPolicy, SatelliteGroup, Source,
};
use orbstate::service::{
    FailureKind, FallbackPolicy, GroupFallback, IdFallback, OrbitalStateService, ServiceError,
    ServiceSettings, REFERENCE_LINE1, REFERENCE_LINE2,
};

#[derive(Clone)]
enum Reply {
    Body(String),
    Fail(CatalogError),
    Hang,
}

/// Catalog that answers from a table keyed by query ("CATNR=25544",
/// "GROUP=stations") and counts requests. Unknown queries get the
/// not-found sentinel.
#[derive(Default)]
struct MockCatalog {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MockCatalog {
    fn with(self, query: &str, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(query.to_string(), reply);
        self
    }

    fn calls(&self, query: &str) -> usize {
        self.calls.lock().unwrap().get(query).copied().unwrap_or(0)
    }

    fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn fetch(&self, query: &CatalogQuery) -> Result<String, CatalogError> {
        let key = query.to_string();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Fail(e)) => Err(e),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(CatalogError::Transport("gave up".into()))
            }
            None => Ok("No GP data found".into()),
        }
    }
}

/// Reference ISS elements renumbered as `id`, with fresh checksums.
fn element_lines(id: u32) -> (String, String) {
    let renumber = |line: &str| {
        let body = format!("{}{:05}{}", &line[..2], id, &line[7..68]);
        let sum = checksum(&body);
        format!("{}{}", body, sum)
    };
    (renumber(REFERENCE_LINE1), renumber(REFERENCE_LINE2))
}

fn entry_json(id: u32, name: &str) -> String {
    let (line1, line2) = element_lines(id);
    format!(
        r#"{{"OBJECT_NAME":"{}","NORAD_CAT_ID":{},"TLE_LINE1":"{}","TLE_LINE2":"{}"}}"#,
        name, id, line1, line2
    )
}

fn body(entries: &[(u32, &str)]) -> Reply {
    let items: Vec<String> = entries.iter().map(|(id, name)| entry_json(*id, name)).collect();
    Reply::Body(format!("[{}]", items.join(",")))
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 3, 12, 0, 0).unwrap()
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

struct Harness {
    service: OrbitalStateService,
    catalog: Arc<MockCatalog>,
    clock: Arc<ManualClock>,
}

fn harness(catalog: MockCatalog, fallback: FallbackPolicy) -> Harness {
    let catalog = Arc::new(catalog);
    let clock = Arc::new(ManualClock::new());
    let policy = FetchPolicy {
        timeout: Duration::from_millis(50),
        max_retries: 0,
        backoff: Duration::from_millis(1),
    };
    let settings = ServiceSettings {
        fallback,
        ..ServiceSettings::default()
    };
    let service = OrbitalStateService::new(
        CatalogClient::new(catalog.clone(), policy),
        settings,
        clock.clone(),
    );
    Harness {
        service,
        catalog,
        clock,
    }
}

#[tokio::test]
async fn repeated_requests_within_ttl_hit_the_cache() {
    let h = harness(
        MockCatalog::default().with("CATNR=25544", body(&[(25544, "ISS (ZARYA)")])),
        FallbackPolicy::default(),
    );

    let first = h.service.current_positions(&ids(&["25544"])).await;
    h.clock.advance(Duration::from_secs(299));
    let second = h.service.current_positions(&ids(&["25544"])).await;

    assert_eq!(first, second);
    assert_eq!(h.catalog.calls("CATNR=25544"), 1);
}

#[tokio::test]
async fn expired_entries_cause_exactly_one_new_fetch() {
    let h = harness(
        MockCatalog::default().with("CATNR=25544", body(&[(25544, "ISS (ZARYA)")])),
        FallbackPolicy::default(),
    );

    h.service.tle("25544").await.unwrap();
    h.clock.advance(Duration::from_secs(300));
    h.service.tle("25544").await.unwrap();
    h.service.tle("25544").await.unwrap();

    assert_eq!(h.catalog.calls("CATNR=25544"), 2);
}

#[tokio::test]
async fn one_missing_id_does_not_affect_the_others() {
    let h = harness(
        MockCatalog::default()
            .with("CATNR=25544", body(&[(25544, "ISS (ZARYA)")]))
            .with("CATNR=20580", body(&[(20580, "HST")])),
        FallbackPolicy::default(),
    );

    let at = epoch() + ChronoDuration::hours(1);
    let batch = h
        .service
        .positions_at(&ids(&["25544", "99999", "20580"]), at)
        .await;

    let returned: Vec<&str> = batch.positions.iter().map(|p| p.satellite_id.as_str()).collect();
    assert_eq!(returned, vec!["25544", "20580"]);
    assert!(batch.positions.iter().all(|p| p.source == Source::Live));
    assert!(batch.positions.iter().all(|p| p.timestamp == at));

    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].satellite_id, "99999");
    assert_eq!(batch.failures[0].kind, FailureKind::NotFound);
    assert!(!batch.is_degraded());
}

#[tokio::test]
async fn decayed_elements_are_a_propagation_failure() {
    let h = harness(
        MockCatalog::default()
            .with("CATNR=25544", body(&[(25544, "ISS (ZARYA)")]))
            .with("CATNR=20580", body(&[(20580, "HST")])),
        FallbackPolicy::default(),
    );

    let at = epoch() + ChronoDuration::days(5 * 365);
    let batch = h.service.positions_at(&ids(&["25544", "20580"]), at).await;

    assert!(batch.positions.is_empty());
    assert_eq!(batch.failures.len(), 2);
    assert!(batch.failures.iter().all(|f| f.kind == FailureKind::Propagation));
    assert_eq!(batch.failures[0].satellite_id, "25544");
    // an answer from the catalog, not an outage
    assert!(!batch.is_degraded());
}

#[tokio::test]
async fn invalid_ids_are_reported_without_a_request() {
    let h = harness(
        MockCatalog::default().with("CATNR=25544", body(&[(25544, "ISS (ZARYA)")])),
        FallbackPolicy::default(),
    );

    let batch = h.service.positions_at(&ids(&["ISS", "25544"]), epoch()).await;
    assert_eq!(batch.positions.len(), 1);
    assert_eq!(batch.failures[0].kind, FailureKind::InvalidId);
    assert_eq!(h.catalog.total(), 1);
}

#[tokio::test]
async fn group_error_yields_empty_list() {
    let h = harness(
        MockCatalog::default().with("GROUP=stations", Reply::Fail(CatalogError::Status(500))),
        FallbackPolicy::default(),
    );

    let records = h.service.group_listing(SatelliteGroup::Stations, 10).await;
    assert!(records.is_empty());

    // failures are not cached
    h.service.group_listing(SatelliteGroup::Stations, 10).await;
    assert_eq!(h.catalog.calls("GROUP=stations"), 2);
}

#[tokio::test]
async fn group_synthetic_policy_returns_reference_elements() {
    let h = harness(
        MockCatalog::default().with("GROUP=weather", Reply::Hang),
        FallbackPolicy {
            by_id: IdFallback::Synthetic,
            by_group: GroupFallback::Synthetic,
        },
    );

    let records = h.service.group_listing(SatelliteGroup::Weather, 10).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source, Source::Fallback);
}

#[tokio::test]
async fn group_listing_truncates_and_fills_the_id_cache() {
    let h = harness(
        MockCatalog::default().with(
            "GROUP=stations",
            body(&[(25544, "ISS (ZARYA)"), (48274, "CSS (TIANHE)"), (20580, "HST")]),
        ),
        FallbackPolicy::default(),
    );

    let records = h.service.group_listing(SatelliteGroup::Stations, 2).await;
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["ISS (ZARYA)", "CSS (TIANHE)"]);

    let tle = h.service.tle("48274").await.unwrap();
    assert_eq!(tle.name, "CSS (TIANHE)");
    assert_eq!(h.catalog.total(), 1);
}

#[tokio::test]
async fn unreachable_catalog_falls_back_per_id() {
    let h = harness(
        MockCatalog::default()
            .with("CATNR=25544", Reply::Hang)
            .with("CATNR=20580", body(&[(20580, "HST")])),
        FallbackPolicy::default(),
    );

    let at = epoch() + ChronoDuration::minutes(45);
    let batch = h.service.positions_at(&ids(&["25544", "20580"]), at).await;
    assert!(batch.failures.is_empty());

    let iss = batch.position("25544").unwrap();
    assert_eq!(iss.source, Source::Fallback);
    assert!(iss.latitude_deg.abs() <= 51.7);
    assert!(iss.altitude_km > 390.0 && iss.altitude_km < 450.0);
    assert_eq!(batch.position("20580").unwrap().source, Source::Live);
    assert!(batch.is_degraded());

    // fallback output is never cached; the live id is
    h.service.positions_at(&ids(&["25544", "20580"]), at).await;
    assert_eq!(h.catalog.calls("CATNR=25544"), 2);
    assert_eq!(h.catalog.calls("CATNR=20580"), 1);
}

#[tokio::test]
async fn omit_policy_reports_unreachable_ids() {
    let h = harness(
        MockCatalog::default().with("CATNR=25544", Reply::Fail(CatalogError::Status(503))),
        FallbackPolicy {
            by_id: IdFallback::Omit,
            by_group: GroupFallback::Empty,
        },
    );

    let batch = h.service.positions_at(&ids(&["25544"]), epoch()).await;
    assert!(batch.positions.is_empty());
    assert_eq!(batch.failures[0].kind, FailureKind::Unreachable);

    let err = h.service.tle("25544").await.unwrap_err();
    assert!(matches!(err, ServiceError::Catalog(CatalogError::Status(503))));
}

#[tokio::test]
async fn not_found_is_never_replaced_by_fallback() {
    let h = harness(MockCatalog::default(), FallbackPolicy::default());

    let err = h.service.tle("99999").await.unwrap_err();
    assert!(matches!(err, ServiceError::Catalog(CatalogError::NotFound(_))));
}

#[tokio::test]
async fn prediction_samples_are_ordered() {
    let h = harness(
        MockCatalog::default().with("CATNR=25544", body(&[(25544, "ISS (ZARYA)")])),
        FallbackPolicy::default(),
    );

    let start = epoch() + ChronoDuration::minutes(30);
    let prediction = h.service.predict_from("25544", 2.0, start).await.unwrap();

    assert_eq!(prediction.satellite_id, "25544");
    assert_eq!(prediction.source, Source::Live);
    assert_eq!(prediction.positions.first().unwrap().timestamp, start);
    assert!(prediction
        .positions
        .windows(2)
        .all(|w| w[0].timestamp < w[1].timestamp));
    assert!(prediction
        .positions
        .iter()
        .all(|p| p.timestamp <= start + ChronoDuration::hours(2)));
}

#[tokio::test]
async fn prediction_falls_back_when_catalog_is_down() {
    let h = harness(
        MockCatalog::default().with("CATNR=43013", Reply::Hang),
        FallbackPolicy::default(),
    );

    let prediction = h.service.predict_from("43013", 1.0, epoch()).await.unwrap();
    assert_eq!(prediction.satellite_id, "43013");
    assert_eq!(prediction.source, Source::Fallback);
    assert!(prediction.positions.iter().all(|p| p.source == Source::Fallback));
}

#[tokio::test]
async fn invalid_horizon_is_rejected_before_fetching() {
    let h = harness(MockCatalog::default(), FallbackPolicy::default());

    let err = h.service.predict("25544", 0.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::Predict(_)));
    let err = h.service.predict("25544", 10_000.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::Predict(_)));
    assert_eq!(h.catalog.total(), 0);
}
