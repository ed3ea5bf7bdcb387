//! Routing provider boundary: a trait for geocoding and directions plus an
//! HTTP implementation against a Google-Directions-style REST surface.
//! Loosely-typed provider JSON is normalized here into the fixed leg schema.

use std::env;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::routing::leg::{
    Measure, RouteLeg, RouteStep, TransitDetails, TransitLine, TransitVehicle, TravelMode,
};

pub const DEFAULT_ROUTING_URL: &str = "https://maps.googleapis.com/maps/api";
const HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug)]
pub enum ProviderError {
    Http(reqwest::Error),
    /// Provider answered but with a non-OK status field (ZERO_RESULTS, OVER_QUERY_LIMIT, ...).
    Status(String),
    /// Response parsed but carried no usable route leg.
    MissingLeg,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "provider request failed: {err}"),
            Self::Status(status) => write!(f, "provider returned status {status}"),
            Self::MissingLeg => write!(f, "provider response contained no route leg"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

pub trait RouteProvider {
    fn geocode(&self, address: &str) -> Result<Coordinates, ProviderError>;
    fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        departure: NaiveDateTime,
    ) -> Result<RouteLeg, ProviderError>;
}

/// Blocking HTTP provider. The planner serializes all routing calls to
/// respect provider rate limits.
pub struct HttpRouteProvider {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl HttpRouteProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Reads `BARHOP_ROUTING_URL` and `BARHOP_API_KEY`.
    pub fn from_env() -> Self {
        let base_url =
            env::var("BARHOP_ROUTING_URL").unwrap_or_else(|_| DEFAULT_ROUTING_URL.to_string());
        let api_key = env::var("BARHOP_API_KEY").unwrap_or_default();
        Self::new(base_url, api_key)
    }
}

impl RouteProvider for HttpRouteProvider {
    fn geocode(&self, address: &str) -> Result<Coordinates, ProviderError> {
        let url = format!("{}/geocode/json", self.base_url);
        let response: RawGeocodeResponse = self
            .client
            .get(url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()?
            .error_for_status()?
            .json()?;

        if response.status != "OK" {
            return Err(ProviderError::Status(response.status));
        }
        response
            .results
            .into_iter()
            .next()
            .map(|result| Coordinates {
                lat: result.geometry.location.lat,
                lng: result.geometry.location.lng,
            })
            .ok_or(ProviderError::MissingLeg)
    }

    fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        departure: NaiveDateTime,
    ) -> Result<RouteLeg, ProviderError> {
        let url = format!("{}/directions/json", self.base_url);
        let departure_unix = departure.and_utc().timestamp().to_string();
        let response: RawDirectionsResponse = self
            .client
            .get(url)
            .query(&[
                ("origin", format!("{},{}", origin.lat, origin.lng).as_str()),
                (
                    "destination",
                    format!("{},{}", destination.lat, destination.lng).as_str(),
                ),
                ("mode", "transit"),
                ("departure_time", departure_unix.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        if response.status != "OK" {
            return Err(ProviderError::Status(response.status));
        }
        let leg = response
            .routes
            .into_iter()
            .next()
            .and_then(|route| route.legs.into_iter().next())
            .ok_or(ProviderError::MissingLeg)?;
        Ok(normalize_leg(leg))
    }
}

// Raw payload shapes. Aliases absorb the naming variance seen across
// provider surfaces (snake_case REST vs camelCase JS-API dumps).

#[derive(Debug, Deserialize)]
struct RawGeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<RawGeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct RawGeocodeResult {
    geometry: RawGeometry,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: RawLocation,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct RawDirectionsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    #[serde(default)]
    legs: Vec<RawLeg>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawLeg {
    #[serde(default)]
    duration: Option<RawMeasure>,
    #[serde(default)]
    distance: Option<RawMeasure>,
    #[serde(default, alias = "startAddress")]
    start_address: Option<String>,
    #[serde(default, alias = "endAddress")]
    end_address: Option<String>,
    #[serde(default, alias = "departureTime")]
    departure_time: Option<RawTimestamp>,
    #[serde(default, alias = "arrivalTime")]
    arrival_time: Option<RawTimestamp>,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeasure {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    value: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawTimestamp {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStep {
    #[serde(default, alias = "travelMode")]
    travel_mode: Option<String>,
    #[serde(default, alias = "html_instructions")]
    instructions: Option<String>,
    #[serde(default)]
    distance: Option<RawMeasure>,
    #[serde(default)]
    duration: Option<RawMeasure>,
    #[serde(default, alias = "transit_details")]
    transit: Option<RawTransit>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTransit {
    #[serde(default, alias = "departureStop")]
    departure_stop: Option<RawStop>,
    #[serde(default, alias = "arrivalStop")]
    arrival_stop: Option<RawStop>,
    #[serde(default, alias = "departureTime")]
    departure_time: Option<RawTimestamp>,
    #[serde(default, alias = "arrivalTime")]
    arrival_time: Option<RawTimestamp>,
    #[serde(default)]
    headsign: Option<String>,
    #[serde(default)]
    line: Option<RawLine>,
    #[serde(default, alias = "numStops")]
    num_stops: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStop {
    Named { name: String },
    Bare(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawLine {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    vehicle: Option<RawVehicle>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVehicle {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    vehicle_type: Option<String>,
    #[serde(default)]
    local_icon: Option<String>,
}

fn measure(raw: Option<RawMeasure>) -> Measure {
    let raw = raw.unwrap_or_default();
    Measure {
        text: raw.text.unwrap_or_default(),
        value: raw.value.unwrap_or(0),
    }
}

fn step_mode(raw: Option<&str>) -> TravelMode {
    match raw.map(str::to_ascii_uppercase).as_deref() {
        Some("TRANSIT") => TravelMode::Transit,
        _ => TravelMode::Walking,
    }
}

fn stop_name(raw: Option<RawStop>) -> Option<String> {
    raw.map(|stop| match stop {
        RawStop::Named { name } => name,
        RawStop::Bare(name) => name,
    })
}

pub(crate) fn normalize_leg(raw: RawLeg) -> RouteLeg {
    let steps: Vec<RouteStep> = raw
        .steps
        .into_iter()
        .map(|step| RouteStep {
            travel_mode: step_mode(step.travel_mode.as_deref()),
            instructions: step.instructions.unwrap_or_default(),
            distance: measure(step.distance),
            duration: measure(step.duration),
            transit: step.transit.map(|transit| TransitDetails {
                departure_stop: stop_name(transit.departure_stop),
                arrival_stop: stop_name(transit.arrival_stop),
                departure_time: transit.departure_time.and_then(|t| t.text),
                arrival_time: transit.arrival_time.and_then(|t| t.text),
                headsign: transit.headsign,
                line: transit.line.map(|line| TransitLine {
                    name: line.name,
                    short_name: line.short_name,
                    color: line.color,
                    vehicle: line.vehicle.map(|vehicle| TransitVehicle {
                        name: vehicle.name,
                        vehicle_type: vehicle.vehicle_type,
                        local_icon: vehicle.local_icon,
                    }),
                }),
                num_stops: transit.num_stops,
            }),
        })
        .collect();

    let overall_mode = if steps
        .iter()
        .any(|step| step.travel_mode == TravelMode::Transit)
    {
        TravelMode::Transit
    } else {
        TravelMode::Walking
    };

    RouteLeg {
        overall_mode,
        duration: measure(raw.duration),
        start_address: raw.start_address.unwrap_or_default(),
        end_address: raw.end_address.unwrap_or_default(),
        departure_time: raw.departure_time.and_then(|t| t.text),
        arrival_time: raw.arrival_time.and_then(|t| t.text),
        distance: Some(measure(raw.distance)),
        steps,
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_snake_case_leg_with_transit_metadata() {
        let raw: RawLeg = serde_json::from_str(
            r#"{
                "duration": {"text": "25 mins", "value": 1500},
                "distance": {"text": "4.2 km", "value": 4200},
                "start_address": "Alexanderplatz 1, Berlin",
                "end_address": "Boxhagener Str. 40, Berlin",
                "departure_time": {"text": "18:04"},
                "steps": [
                    {
                        "travel_mode": "WALKING",
                        "html_instructions": "Walk to U Alexanderplatz",
                        "duration": {"text": "5 mins", "value": 300}
                    },
                    {
                        "travel_mode": "TRANSIT",
                        "duration": {"text": "20 mins", "value": 1200},
                        "transit_details": {
                            "departure_stop": {"name": "U Alexanderplatz"},
                            "arrival_stop": {"name": "S Ostkreuz"},
                            "headsign": "Erkner",
                            "num_stops": 4,
                            "line": {
                                "short_name": "S3",
                                "vehicle": {"type": "HEAVY_RAIL", "name": "S-Bahn"}
                            }
                        }
                    }
                ]
            }"#,
        )
        .expect("raw leg should parse");

        let leg = normalize_leg(raw);
        assert_eq!(leg.overall_mode, TravelMode::Transit);
        assert_eq!(leg.duration.value, 1500);
        assert_eq!(leg.departure_time.as_deref(), Some("18:04"));
        assert_eq!(leg.steps.len(), 2);
        let transit = leg.steps[1].transit.as_ref().expect("transit metadata");
        assert_eq!(transit.arrival_stop.as_deref(), Some("S Ostkreuz"));
        assert_eq!(transit.num_stops, Some(4));
        let line = transit.line.as_ref().expect("line");
        assert_eq!(line.short_name.as_deref(), Some("S3"));
    }

    #[test]
    fn normalizes_camel_case_variant_and_defaults_walking() {
        let raw: RawLeg = serde_json::from_str(
            r#"{
                "duration": {"value": 600},
                "startAddress": "A",
                "endAddress": "B",
                "steps": [{"travelMode": "walking", "instructions": "Head north"}]
            }"#,
        )
        .expect("raw leg should parse");

        let leg = normalize_leg(raw);
        assert_eq!(leg.overall_mode, TravelMode::Walking);
        assert_eq!(leg.start_address, "A");
        assert_eq!(leg.steps[0].instructions, "Head north");
        assert!(leg.steps[0].transit.is_none());
    }

    #[test]
    fn empty_leg_normalizes_to_zero_duration() {
        let leg = normalize_leg(RawLeg::default());
        assert_eq!(leg.duration_seconds(), 0);
        assert!(!leg.fallback);
    }
}
