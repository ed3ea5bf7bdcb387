//! Cache-backed routing client. Geocode results are cached forever by
//! normalized address; route legs by origin, destination and the departure
//! time truncated to the minute, which bounds key cardinality across
//! near-identical trial timestamps.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;

use crate::routing::leg::RouteLeg;
use crate::routing::provider::{Coordinates, ProviderError, RouteProvider};
use crate::store::KvStore;

pub const GEOCODE_CACHE_KEY: &str = "geocode_cache";
pub const ROUTE_CACHE_KEY: &str = "route_cache";

/// Minute granularity matches the provider's schedule resolution.
const DEPARTURE_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug)]
pub enum RouteError {
    /// Address could not be resolved to coordinates.
    Geocode { address: String, source: ProviderError },
    /// Both endpoints resolved but no route was found between them.
    NoRoute {
        origin: String,
        destination: String,
        source: ProviderError,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geocode { address, source } => {
                write!(f, "failed to geocode '{address}': {source}")
            }
            Self::NoRoute {
                origin,
                destination,
                source,
            } => write!(f, "no route from '{origin}' to '{destination}': {source}"),
        }
    }
}

impl std::error::Error for RouteError {}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq)]
struct CachedCoordinates {
    lat: f64,
    lng: f64,
}

pub struct Router<P> {
    provider: P,
    geocode_cache: HashMap<String, CachedCoordinates>,
    route_cache: HashMap<String, RouteLeg>,
    store: Option<Box<dyn KvStore>>,
}

impl<P: RouteProvider> Router<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            geocode_cache: HashMap::new(),
            route_cache: HashMap::new(),
            store: None,
        }
    }

    /// Attaches a persistent store and loads any previously saved caches.
    /// Unreadable cache documents are discarded, not fatal.
    pub fn with_store(provider: P, store: Box<dyn KvStore>) -> Self {
        let mut router = Self::new(provider);
        if let Ok(Some(raw)) = store.get(GEOCODE_CACHE_KEY) {
            if let Ok(cache) = serde_json::from_str(&raw) {
                router.geocode_cache = cache;
            }
        }
        if let Ok(Some(raw)) = store.get(ROUTE_CACHE_KEY) {
            if let Ok(cache) = serde_json::from_str(&raw) {
                router.route_cache = cache;
            }
        }
        router.store = Some(store);
        router
    }

    pub fn geocode_cache_len(&self) -> usize {
        self.geocode_cache.len()
    }

    pub fn route_cache_len(&self) -> usize {
        self.route_cache.len()
    }

    pub fn geocode(&mut self, address: &str) -> Result<Coordinates, RouteError> {
        let key = normalize_address(address);
        if let Some(cached) = self.geocode_cache.get(&key) {
            return Ok(Coordinates {
                lat: cached.lat,
                lng: cached.lng,
            });
        }

        let coordinates =
            self.provider
                .geocode(address)
                .map_err(|source| RouteError::Geocode {
                    address: address.to_string(),
                    source,
                })?;
        self.geocode_cache.insert(
            key,
            CachedCoordinates {
                lat: coordinates.lat,
                lng: coordinates.lng,
            },
        );
        self.persist(GEOCODE_CACHE_KEY);
        Ok(coordinates)
    }

    pub fn route(
        &mut self,
        origin: &str,
        destination: &str,
        departure: NaiveDateTime,
    ) -> Result<RouteLeg, RouteError> {
        let key = route_cache_key(origin, destination, departure);
        if let Some(cached) = self.route_cache.get(&key) {
            return Ok(cached.clone());
        }

        let origin_location = self.geocode(origin)?;
        let destination_location = self.geocode(destination)?;

        let leg = self
            .provider
            .directions(origin_location, destination_location, departure)
            .map_err(|source| RouteError::NoRoute {
                origin: origin.to_string(),
                destination: destination.to_string(),
                source,
            })?;
        self.route_cache.insert(key, leg.clone());
        self.persist(ROUTE_CACHE_KEY);
        Ok(leg)
    }

    /// Best-effort cache persistence. A broken store must not fail a trial.
    fn persist(&mut self, key: &str) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        let payload = match key {
            GEOCODE_CACHE_KEY => serde_json::to_string(&self.geocode_cache),
            _ => serde_json::to_string(&self.route_cache),
        };
        match payload {
            Ok(payload) => {
                if let Err(err) = store.put(key, &payload) {
                    eprintln!("warning: failed to persist {key}: {err}");
                }
            }
            Err(err) => eprintln!("warning: failed to serialize {key}: {err}"),
        }
    }
}

pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

pub fn route_cache_key(origin: &str, destination: &str, departure: NaiveDateTime) -> String {
    format!(
        "{}|{}|{}",
        normalize_address(origin),
        normalize_address(destination),
        departure.format(DEPARTURE_KEY_FORMAT)
    )
}
