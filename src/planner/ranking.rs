//! Orders finished trials by total travel time and keeps the best few.

use serde::{Deserialize, Serialize};

use crate::model::Event;
use crate::planner::scheduler::TrialOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTrial {
    pub total_seconds: i64,
    /// Quality flags carried from the trial ("degraded assignment",
    /// "fallback legs"); empty for clean trials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub event: Event,
}

/// Ascending by total time; on ties, trials with fewer quality notes first.
pub fn rank_trials(outcomes: Vec<TrialOutcome>, keep: usize) -> Vec<RankedTrial> {
    let mut ranked: Vec<RankedTrial> = outcomes
        .into_iter()
        .map(|outcome| RankedTrial {
            total_seconds: outcome.total_seconds,
            notes: outcome.notes.iter().map(|note| note.to_string()).collect(),
            event: outcome.event,
        })
        .collect();

    ranked.sort_by(|left, right| {
        left.total_seconds
            .cmp(&right.total_seconds)
            .then_with(|| left.notes.len().cmp(&right.notes.len()))
    });
    ranked.truncate(keep);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn outcome(total_seconds: i64, notes: Vec<&'static str>) -> TrialOutcome {
        TrialOutcome {
            event: Event::new(
                "a",
                "b",
                NaiveDate::from_ymd_opt(2026, 5, 9)
                    .unwrap()
                    .and_hms_opt(18, 0, 0)
                    .unwrap(),
                45,
            ),
            total_seconds,
            notes,
        }
    }

    #[test]
    fn keeps_smallest_scores_in_ascending_order() {
        let outcomes = [500, 100, 300, 700, 200]
            .into_iter()
            .map(|total| outcome(total, Vec::new()))
            .collect();
        let ranked = rank_trials(outcomes, 3);
        let totals: Vec<i64> = ranked.iter().map(|trial| trial.total_seconds).collect();
        assert_eq!(totals, vec![100, 200, 300]);
    }

    #[test]
    fn clean_trials_win_score_ties() {
        let outcomes = vec![
            outcome(100, vec!["fallback legs"]),
            outcome(100, Vec::new()),
        ];
        let ranked = rank_trials(outcomes, 2);
        assert!(ranked[0].notes.is_empty());
        assert_eq!(ranked[1].notes, vec!["fallback legs".to_string()]);
    }
}
