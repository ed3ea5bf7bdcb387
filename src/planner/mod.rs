//! Best-of-N search over randomized candidate events. Trial preparation is
//! pure computation and runs in parallel; the routing phase walks trials
//! one at a time so the external provider is never called concurrently.

pub mod assignment;
pub mod grouping;
pub mod ranking;
pub mod rng;
pub mod scheduler;

use std::fmt;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::Participant;
use crate::planner::grouping::GroupingError;
use crate::planner::ranking::{rank_trials, RankedTrial};
use crate::planner::rng::Rng;
use crate::planner::scheduler::{prepare_trial, price_trial};
use crate::routing::provider::RouteProvider;
use crate::routing::Router;

pub const DEFAULT_TRIALS: usize = 5000;
pub const DEFAULT_KEEP: usize = 5;
pub const DEFAULT_ASSIGNMENT_ATTEMPTS: usize = 100;

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

fn default_keep() -> usize {
    DEFAULT_KEEP
}

fn default_assignment_attempts() -> usize {
    DEFAULT_ASSIGNMENT_ATTEMPTS
}

fn default_grouping_attempts() -> usize {
    grouping::DEFAULT_GROUPING_ATTEMPTS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub start_address: String,
    pub end_address: String,
    pub start: NaiveDateTime,
    pub time_per_stop_min: i64,
    pub group_count: usize,
    pub stop_count: usize,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_keep")]
    pub keep: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_assignment_attempts")]
    pub max_assignment_attempts: usize,
    #[serde(default = "default_grouping_attempts")]
    pub max_grouping_attempts: usize,
}

#[derive(Debug)]
pub enum PlanError {
    /// The configuration can never produce a plan (zero stops, more stops
    /// than groups, empty trial budget).
    Infeasible(String),
    /// Every trial failed group formation; reported distinctly from
    /// per-leg routing failures, which only degrade scores.
    Grouping(GroupingError),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeasible(reason) => write!(f, "infeasible plan configuration: {reason}"),
            Self::Grouping(err) => write!(f, "group formation failed: {err}"),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<GroupingError> for PlanError {
    fn from(err: GroupingError) -> Self {
        Self::Grouping(err)
    }
}

fn check_feasibility(config: &PlanConfig) -> Result<(), PlanError> {
    if config.stop_count == 0 {
        return Err(PlanError::Infeasible("stop count is zero".to_string()));
    }
    if config.group_count < config.stop_count {
        return Err(PlanError::Infeasible(format!(
            "{} groups cannot cover {} stops (hosts per stop would be zero)",
            config.group_count, config.stop_count
        )));
    }
    if config.trials == 0 {
        return Err(PlanError::Infeasible("trial budget is zero".to_string()));
    }
    Ok(())
}

/// Runs the full search: `trials` independent candidate events, each with a
/// fresh shuffle and schedule, priced through the shared cache-backed
/// router; returns the `keep` best by total travel time.
pub fn run_search<P: RouteProvider>(
    config: &PlanConfig,
    participants: &[Participant],
    router: &mut Router<P>,
) -> Result<Vec<RankedTrial>, PlanError> {
    check_feasibility(config)?;

    let base_seed = config
        .seed
        .unwrap_or_else(|| Rng::from_entropy().next_u64());

    // Pure phase, parallel across trials.
    let prepared: Vec<_> = (0..config.trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = Rng::new(base_seed.wrapping_add(trial as u64));
            prepare_trial(config, participants, &mut rng)
        })
        .collect();

    // Routing phase, strictly sequential.
    let mut outcomes = Vec::with_capacity(prepared.len());
    let mut last_grouping_error = None;
    for result in prepared {
        match result {
            Ok(trial) => outcomes.push(price_trial(trial, router)),
            Err(err) => {
                eprintln!("warning: trial skipped: {err}");
                last_grouping_error = Some(err);
            }
        }
    }

    if outcomes.is_empty() {
        return Err(match last_grouping_error {
            Some(err) => PlanError::Grouping(err),
            None => PlanError::Infeasible("no trials produced an event".to_string()),
        });
    }
    Ok(rank_trials(outcomes, config.keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rejects_configurations_without_hosts() {
        let config = PlanConfig {
            start_address: "a".to_string(),
            end_address: "b".to_string(),
            start: NaiveDate::from_ymd_opt(2026, 5, 9)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
            time_per_stop_min: 45,
            group_count: 2,
            stop_count: 3,
            trials: 10,
            keep: 5,
            seed: Some(1),
            max_assignment_attempts: 10,
            max_grouping_attempts: 10,
        };
        assert!(matches!(
            check_feasibility(&config),
            Err(PlanError::Infeasible(_))
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PlanConfig = serde_json::from_str(
            r#"{
                "start_address": "Start Sq 1",
                "end_address": "End Ave 2",
                "start": "2026-05-09T18:00:00",
                "time_per_stop_min": 45,
                "group_count": 6,
                "stop_count": 3
            }"#,
        )
        .expect("config should parse");
        assert_eq!(config.trials, DEFAULT_TRIALS);
        assert_eq!(config.keep, DEFAULT_KEEP);
        assert_eq!(config.seed, None);
    }
}
