//! Fixed internal shape for one travel segment. Provider payloads are
//! normalized into this schema at the boundary so the planner never sees
//! provider-specific naming.

use serde::{Deserialize, Serialize};

/// A `{text, value}` pair as routing providers report distances and
/// durations. `value` is meters or seconds depending on context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: i64,
}

impl Measure {
    pub fn seconds(value: i64) -> Self {
        Self {
            text: format!("{} mins", (value + 59) / 60),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TravelMode {
    Walking,
    Transit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitVehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub vehicle_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<TransitVehicle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_stop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_stop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headsign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<TransitLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_stops: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub travel_mode: TravelMode,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub distance: Measure,
    #[serde(default)]
    pub duration: Measure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit: Option<TransitDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub overall_mode: TravelMode,
    pub duration: Measure,
    #[serde(default)]
    pub start_address: String,
    #[serde(default)]
    pub end_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Measure>,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
    /// Set when the leg could not be resolved and a zero-duration
    /// substitute was used instead. Scores containing such legs are biased.
    #[serde(default)]
    pub fallback: bool,
}

impl RouteLeg {
    /// Zero-duration substitute for an unresolvable leg. Keeps leg indexing
    /// consistent so the rest of the itinerary still lines up.
    pub fn fallback(start_address: &str, end_address: &str) -> Self {
        Self {
            overall_mode: TravelMode::Walking,
            duration: Measure::default(),
            start_address: start_address.to_string(),
            end_address: end_address.to_string(),
            departure_time: None,
            arrival_time: None,
            distance: None,
            steps: Vec::new(),
            fallback: true,
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration.value
    }
}
