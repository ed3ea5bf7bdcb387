//! Diagnostics for rosters and plan configurations, reported before any
//! provider call is spent on an infeasible setup.

use std::fmt;

use serde::Serialize;

use crate::model::Participant;
use crate::planner::assignment::hosts_per_stop;
use crate::planner::PlanConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.diagnostics.extend(other.diagnostics);
    }
}

pub fn validate_roster(participants: &[Participant]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if participants.is_empty() {
        report.push(ValidationSeverity::Error, "roster", "roster is empty");
        return report;
    }
    for (index, participant) in participants.iter().enumerate() {
        if participant.name.trim().is_empty() {
            report.push(
                ValidationSeverity::Error,
                format!("roster[{index}]"),
                "participant has an empty name",
            );
        }
        if !participant.has_address() {
            report.push(
                ValidationSeverity::Warning,
                format!("roster[{index}]"),
                format!("'{}' has no address and cannot host", participant.name),
            );
        }
    }
    report
}

/// Feasibility of the requested shape against the pool: enough groups for
/// the stops, enough addressed participants for the groups, and a flag for
/// shapes whose even-distribution invariant can never be met.
pub fn validate_plan(config: &PlanConfig, participants: &[Participant]) -> ValidationReport {
    let mut report = validate_roster(participants);
    report.merge(validate_config(config, participants));
    report
}

fn validate_config(config: &PlanConfig, participants: &[Participant]) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.stop_count == 0 {
        report.push(ValidationSeverity::Error, "config", "stop count is zero");
        return report;
    }
    if config.group_count < config.stop_count {
        report.push(
            ValidationSeverity::Error,
            "config",
            format!(
                "{} groups cannot cover {} stops",
                config.group_count, config.stop_count
            ),
        );
        return report;
    }
    if participants.len() < config.group_count {
        report.push(
            ValidationSeverity::Error,
            "config",
            format!(
                "{} participants cannot fill {} groups",
                participants.len(),
                config.group_count
            ),
        );
    }
    let addressed = participants
        .iter()
        .filter(|participant| participant.has_address())
        .count();
    if addressed < config.group_count {
        report.push(
            ValidationSeverity::Error,
            "config",
            format!(
                "only {addressed} addressed participants for {} groups; every group needs a host",
                config.group_count
            ),
        );
    }

    let hosts = hosts_per_stop(config.group_count, config.stop_count);
    if hosts > 0 && config.group_count % hosts != 0 {
        report.push(
            ValidationSeverity::Warning,
            "config",
            format!(
                "{} groups over {hosts} hosts per stop cannot satisfy the even-distribution \
                 rule; plans will carry degraded schedules",
                config.group_count
            ),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config(groups: usize, stops: usize) -> PlanConfig {
        PlanConfig {
            start_address: "a".to_string(),
            end_address: "b".to_string(),
            start: NaiveDate::from_ymd_opt(2026, 5, 9)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
            time_per_stop_min: 45,
            group_count: groups,
            stop_count: stops,
            trials: 10,
            keep: 5,
            seed: None,
            max_assignment_attempts: 100,
            max_grouping_attempts: 100,
        }
    }

    fn pool(total: usize, addressed: usize) -> Vec<Participant> {
        (0..total)
            .map(|index| {
                let address = (index < addressed).then(|| format!("Street {index}"));
                Participant::new(format!("p{index}"), address)
            })
            .collect()
    }

    #[test]
    fn merge_appends_without_dropping_diagnostics() {
        let mut left = ValidationReport::default();
        left.push(ValidationSeverity::Warning, "roster[0]", "no address");
        let mut right = ValidationReport::default();
        right.push(ValidationSeverity::Error, "config", "stop count is zero");

        left.merge(right);
        assert_eq!(left.diagnostics.len(), 2);
        assert!(left.has_errors());
        assert_eq!(left.diagnostics[1].context, "config");
    }

    #[test]
    fn missing_addresses_are_warnings_not_errors() {
        let report = validate_roster(&pool(4, 3));
        assert!(!report.has_errors());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(
            report.diagnostics[0].severity,
            ValidationSeverity::Warning
        );
    }

    #[test]
    fn too_few_addressed_participants_is_an_error() {
        let report = validate_plan(&config(6, 3), &pool(6, 5));
        assert!(report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|diag| diag.message.contains("every group needs a host")));
    }

    #[test]
    fn indivisible_shapes_get_a_degradation_warning() {
        // 7 groups over 3 stops: 2 hosts per stop, 7 % 2 != 0.
        let report = validate_plan(&config(7, 3), &pool(14, 14));
        assert!(!report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|diag| diag.message.contains("even-distribution")));
    }

    #[test]
    fn divisible_shape_with_full_roster_is_clean() {
        let report = validate_plan(&config(6, 3), &pool(12, 12));
        assert!(report.diagnostics.is_empty());
    }
}
