//! Cache behavior of the routing client: call counting against a scripted
//! provider, key normalization and persistence across router instances.

use std::cell::Cell;
use std::fs;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, NaiveDateTime};

use barhop::routing::{
    Coordinates, Measure, ProviderError, RouteLeg, RouteProvider, Router, TravelMode,
};
use barhop::store::JsonFileStore;

#[derive(Clone, Default)]
struct CallCounts {
    geocode: Rc<Cell<usize>>,
    directions: Rc<Cell<usize>>,
}

struct CountingProvider {
    counts: CallCounts,
    fail_geocode: bool,
}

impl CountingProvider {
    fn new(counts: CallCounts) -> Self {
        Self {
            counts,
            fail_geocode: false,
        }
    }
}

impl RouteProvider for CountingProvider {
    fn geocode(&self, address: &str) -> Result<Coordinates, ProviderError> {
        self.counts.geocode.set(self.counts.geocode.get() + 1);
        if self.fail_geocode {
            return Err(ProviderError::Status("ZERO_RESULTS".to_string()));
        }
        let sum: u32 = address.bytes().map(u32::from).sum();
        Ok(Coordinates {
            lat: f64::from(sum % 90),
            lng: f64::from(sum % 180),
        })
    }

    fn directions(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
        _departure: NaiveDateTime,
    ) -> Result<RouteLeg, ProviderError> {
        self.counts.directions.set(self.counts.directions.get() + 1);
        Ok(RouteLeg {
            overall_mode: TravelMode::Walking,
            duration: Measure::seconds(600),
            start_address: String::new(),
            end_address: String::new(),
            departure_time: None,
            arrival_time: None,
            distance: None,
            steps: Vec::new(),
            fallback: false,
        })
    }
}

fn departure() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 5, 9)
        .unwrap()
        .and_hms_opt(18, 30, 12)
        .unwrap()
}

fn unique_temp_dir(name: &str) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir()
        .join(format!("barhop-{name}-{stamp}"))
        .to_string_lossy()
        .into_owned()
}

#[test]
fn repeated_routes_in_the_same_minute_hit_the_provider_once() {
    let counts = CallCounts::default();
    let mut router = Router::new(CountingProvider::new(counts.clone()));

    let first = router
        .route("Canal St 5", "Dam 1", departure())
        .expect("route resolves");
    let second = router
        .route("Canal St 5", "Dam 1", departure() + chrono::Duration::seconds(40))
        .expect("route resolves");

    assert_eq!(first, second);
    assert_eq!(counts.directions.get(), 1);
    // One geocode per endpoint, both served from cache on the second call.
    assert_eq!(counts.geocode.get(), 2);
    assert_eq!(router.route_cache_len(), 1);

    router
        .route("Canal St 5", "Dam 1", departure() + chrono::Duration::seconds(60))
        .expect("route resolves");
    assert_eq!(counts.directions.get(), 2);
    assert_eq!(router.route_cache_len(), 2);
}

#[test]
fn address_variants_share_one_geocode_entry() {
    let counts = CallCounts::default();
    let mut router = Router::new(CountingProvider::new(counts.clone()));

    router.geocode(" 123 Main St ").expect("geocode resolves");
    router.geocode("123 main st").expect("geocode resolves");

    assert_eq!(counts.geocode.get(), 1);
    assert_eq!(router.geocode_cache_len(), 1);
}

#[test]
fn caches_survive_across_router_instances() {
    let dir = unique_temp_dir("cache");

    let warm_counts = CallCounts::default();
    let mut warm = Router::with_store(
        CountingProvider::new(warm_counts.clone()),
        Box::new(JsonFileStore::new(&dir)),
    );
    warm.route("Canal St 5", "Dam 1", departure())
        .expect("route resolves");
    assert_eq!(warm_counts.directions.get(), 1);
    drop(warm);

    // Fresh router over the same store; the provider must stay idle.
    let cold_counts = CallCounts::default();
    let mut cold = Router::with_store(
        CountingProvider::new(cold_counts.clone()),
        Box::new(JsonFileStore::new(&dir)),
    );
    assert_eq!(cold.route_cache_len(), 1);
    assert_eq!(cold.geocode_cache_len(), 2);
    cold.route("Canal St 5", "Dam 1", departure())
        .expect("route resolves");
    assert_eq!(cold_counts.directions.get(), 0);
    assert_eq!(cold_counts.geocode.get(), 0);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn geocode_failures_name_the_address() {
    let counts = CallCounts::default();
    let mut provider = CountingProvider::new(counts);
    provider.fail_geocode = true;
    let mut router = Router::new(provider);

    let err = router
        .route("Nowhere 1", "Dam 1", departure())
        .unwrap_err();
    assert!(err.to_string().contains("Nowhere 1"));
}
