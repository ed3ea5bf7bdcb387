//! JSON payload builders for the HTTP API. Route handlers stay thin; all
//! request parsing, validation and serialization happens here.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::import::{load_roster, DEFAULT_ROSTER_PATH};
use crate::data::validate::validate_plan;
use crate::data::{load_results, save_results, DEFAULT_RESULTS_PATH};
use crate::model::Participant;
use crate::planner::{run_search, PlanConfig, PlanError};
use crate::routing::{HttpRouteProvider, Router};
use crate::store::{JsonFileStore, DEFAULT_DATA_DIR};

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    #[serde(flatten)]
    pub config: PlanConfig,
    /// When absent, the persisted roster is used.
    #[serde(default)]
    pub participants: Option<Vec<Participant>>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioSummary {
    pub group_count: usize,
    pub stop_count: usize,
    pub trials: usize,
    pub keep: usize,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse<'a> {
    pub status: &'static str,
    pub scenario: ScenarioSummary,
    pub results: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: serde_json::Value,
}

#[derive(Debug)]
pub enum PlanPayloadError {
    Parse(serde_json::Error),
    Validation(String),
    Plan(PlanError),
}

impl fmt::Display for PlanPayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Validation(_) => write!(f, "invalid plan request"),
            Self::Plan(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlanPayloadError {}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "barhop-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn participants_payload() -> Result<String, serde_json::Error> {
    let roster = load_roster(DEFAULT_ROSTER_PATH).unwrap_or_default();
    serde_json::to_string_pretty(&roster)
}

/// Handles POST /api/plan: validates the request, runs a full search with
/// the persistent route caches, saves the results and returns them ranked.
pub fn plan_payload(body: &str) -> Result<String, PlanPayloadError> {
    let request: PlanRequest = serde_json::from_str(body).map_err(PlanPayloadError::Parse)?;
    let participants = match request.participants {
        Some(participants) => participants,
        None => load_roster(DEFAULT_ROSTER_PATH).unwrap_or_default(),
    };

    let report = validate_plan(&request.config, &participants);
    if report.has_errors() {
        let errors =
            serde_json::to_value(&report.diagnostics).map_err(PlanPayloadError::Parse)?;
        let response = ValidationErrorResponse {
            status: "error",
            message: "plan request failed validation",
            errors,
        };
        let payload =
            serde_json::to_string_pretty(&response).map_err(PlanPayloadError::Parse)?;
        return Err(PlanPayloadError::Validation(payload));
    }

    let store = JsonFileStore::new(DEFAULT_DATA_DIR);
    let mut router = Router::with_store(HttpRouteProvider::from_env(), Box::new(store));
    let results = run_search(&request.config, &participants, &mut router)
        .map_err(PlanPayloadError::Plan)?;

    if let Err(err) = save_results(&results, DEFAULT_RESULTS_PATH) {
        eprintln!("warning: failed to save results: {err}");
    }

    let results_value = serde_json::to_value(&results).map_err(PlanPayloadError::Parse)?;
    let response = PlanResponse {
        status: "ok",
        scenario: ScenarioSummary {
            group_count: request.config.group_count,
            stop_count: request.config.stop_count,
            trials: request.config.trials,
            keep: request.config.keep,
        },
        results: &results_value,
    };
    serde_json::to_string_pretty(&response).map_err(PlanPayloadError::Parse)
}

/// Handles GET /api/share/<group-id> against the last saved results.
/// Searches ranked events best-first for the requested group.
pub fn share_payload(path: &str) -> Option<String> {
    let id_part = path.strip_prefix("/api/share/")?;
    let group_id = Uuid::parse_str(id_part.trim_end_matches('/')).ok()?;

    let results = load_results(DEFAULT_RESULTS_PATH).ok()?;
    for ranked in &results {
        if let Some(index) = ranked.event.group_index_by_id(group_id) {
            let plan = ranked.event.share_plan(index)?;
            return serde_json::to_string_pretty(&plan).ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_payload_rejects_unparseable_bodies() {
        let err = plan_payload("not json").unwrap_err();
        assert!(matches!(err, PlanPayloadError::Parse(_)));
    }

    #[test]
    fn plan_payload_rejects_infeasible_requests_with_diagnostics() {
        // 2 groups over 3 stops plus an inline roster without addresses.
        let body = r#"{
            "start_address": "a",
            "end_address": "b",
            "start": "2026-05-09T18:00:00",
            "time_per_stop_min": 45,
            "group_count": 2,
            "stop_count": 3,
            "trials": 5,
            "participants": [{"name": "Ana"}, {"name": "Ben"}]
        }"#;
        match plan_payload(body).unwrap_err() {
            PlanPayloadError::Validation(payload) => {
                assert!(payload.contains("plan request failed validation"));
                assert!(payload.contains("cannot cover"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn share_payload_rejects_malformed_ids() {
        assert!(share_payload("/api/share/not-a-uuid").is_none());
    }
}
