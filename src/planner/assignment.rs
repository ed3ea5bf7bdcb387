//! Randomized group-to-host schedule generation and the invariants that make
//! a schedule acceptable. Exact combinatorial construction is hard; checking
//! is cheap, so callers retry generation until the validator is satisfied.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::planner::rng::Rng;

/// A candidate schedule: `schedule[group][stop]` is the index of the group
/// hosting `group` at that stop. A group hosting a stop points at itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub stops: usize,
    pub groups: usize,
    pub hosts_per_stop: usize,
    pub schedule: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentDefect {
    /// The schedule grid does not match the declared group and stop counts.
    Malformed,
    /// `schedule[group][stop]` points at a group that is not hosting there.
    MissingHost { group: usize, stop: usize },
    /// Two groups would follow identical full schedules.
    DuplicateSchedule { first: usize, second: usize },
    /// Co-visitor sets across a stop transition overlap too much.
    InsufficientMixing {
        stop: usize,
        host: usize,
        next_host: usize,
    },
    /// A host receives fewer visitors than the even-distribution floor.
    UnevenDistribution { stop: usize, host: usize },
}

impl fmt::Display for AssignmentDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => {
                write!(f, "schedule grid does not match the declared shape")
            }
            Self::MissingHost { group, stop } => {
                write!(f, "group {group} visits a non-host at stop {stop}")
            }
            Self::DuplicateSchedule { first, second } => {
                write!(f, "groups {first} and {second} share an identical schedule")
            }
            Self::InsufficientMixing {
                stop,
                host,
                next_host,
            } => write!(
                f,
                "visitors barely change between host {host} at stop {stop} and host {next_host} at stop {}",
                stop + 1
            ),
            Self::UnevenDistribution { stop, host } => {
                write!(f, "host {host} receives too few visitors at stop {stop}")
            }
        }
    }
}

pub fn hosts_per_stop(groups: usize, stops: usize) -> usize {
    groups / stops
}

fn visitor_quota(groups: usize, hosts_per_stop: usize) -> usize {
    // ceil(G / H) - 1: a host may take that many groups beyond itself.
    (groups + hosts_per_stop - 1) / hosts_per_stop - 1
}

/// Draws one candidate schedule. Each group hosts at most once across the
/// whole run; visitors are drawn uniformly from a stop's hosts, redrawing
/// any host already at its quota.
///
/// Precondition: `1 <= stops <= groups` (so `hosts_per_stop >= 1`); enforced
/// by config validation before any trial runs.
pub fn generate_assignment(stops: usize, groups: usize, rng: &mut Rng) -> Assignment {
    assert!(stops >= 1 && groups >= stops, "invalid stop/group counts");
    let hosts_per_stop = hosts_per_stop(groups, stops);
    let quota = visitor_quota(groups, hosts_per_stop);

    let mut already_hosting: HashSet<usize> = HashSet::new();
    let mut hosts_by_stop: Vec<Vec<usize>> = Vec::with_capacity(stops);
    let mut counts = vec![vec![0usize; groups]; stops];

    for stop in 0..stops {
        let mut hosts = Vec::with_capacity(hosts_per_stop);
        while hosts.len() < hosts_per_stop {
            let candidate = rng.index(groups);
            if already_hosting.insert(candidate) {
                counts[stop][candidate] = 1;
                hosts.push(candidate);
            }
        }
        hosts_by_stop.push(hosts);
    }

    let mut schedule = vec![vec![0usize; stops]; groups];
    for group in 0..groups {
        for stop in 0..stops {
            if hosts_by_stop[stop].contains(&group) {
                schedule[group][stop] = group;
                continue;
            }
            let host = loop {
                let candidate = hosts_by_stop[stop][rng.index(hosts_per_stop)];
                if counts[stop][candidate] <= quota {
                    break candidate;
                }
            };
            counts[stop][host] += 1;
            schedule[group][stop] = host;
        }
    }

    Assignment {
        stops,
        groups,
        hosts_per_stop,
        schedule,
    }
}

/// Pure validity check; also usable for externally supplied schedules.
/// Returns the first defect found, walking checks in a fixed order.
pub fn validate_assignment(assignment: &Assignment) -> Result<(), AssignmentDefect> {
    let schedule = &assignment.schedule;

    // 0. Shape: one row per group, one entry per stop. External schedules
    //    arrive deserialized and may not line up with their declared counts.
    if schedule.len() != assignment.groups
        || schedule.iter().any(|row| row.len() != assignment.stops)
    {
        return Err(AssignmentDefect::Malformed);
    }

    // 1. Host presence: every entry resolves to an actual host at that stop.
    //    An out-of-range host index is a missing host, not a panic.
    for (group, row) in schedule.iter().enumerate() {
        for (stop, &host) in row.iter().enumerate() {
            if schedule.get(host).map(|hosts| hosts[stop]) != Some(host) {
                return Err(AssignmentDefect::MissingHost { group, stop });
            }
        }
    }

    // 2. No two groups follow identical full schedules.
    for first in 0..schedule.len() {
        for second in first + 1..schedule.len() {
            if schedule[first] == schedule[second] {
                return Err(AssignmentDefect::DuplicateSchedule { first, second });
            }
        }
    }

    let partners = covisitor_sets(assignment);

    // 3. Consecutive stops must sufficiently mix co-visitors.
    let threshold = assignment.hosts_per_stop.saturating_sub(1);
    for stop in 0..partners.len().saturating_sub(1) {
        for (&host, visitors) in &partners[stop] {
            for (&next_host, next_visitors) in &partners[stop + 1] {
                let moved_on = visitors.difference(next_visitors).count();
                if moved_on < threshold {
                    return Err(AssignmentDefect::InsufficientMixing {
                        stop,
                        host,
                        next_host,
                    });
                }
            }
        }
    }

    // 4. Even distribution: every host fills to the ceiling quota.
    let floor = (assignment.groups + assignment.hosts_per_stop - 1) / assignment.hosts_per_stop;
    for (stop, hosts) in partners.iter().enumerate() {
        for (&host, visitors) in hosts {
            if visitors.len() < floor {
                return Err(AssignmentDefect::UnevenDistribution { stop, host });
            }
        }
    }

    Ok(())
}

/// Per stop, which groups (host included) gather at each host.
fn covisitor_sets(assignment: &Assignment) -> Vec<BTreeMap<usize, BTreeSet<usize>>> {
    let mut partners: Vec<BTreeMap<usize, BTreeSet<usize>>> = vec![BTreeMap::new(); assignment.stops];
    for (group, row) in assignment.schedule.iter().enumerate() {
        for (stop, &host) in row.iter().enumerate() {
            partners[stop].entry(host).or_default().insert(group);
        }
    }
    partners
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub assignment: Assignment,
    pub valid: bool,
    pub attempts: usize,
}

/// Retries generation up to `max_attempts`. On exhaustion the last candidate
/// is returned with `valid = false`; producing a result beats blocking.
pub fn generate_with_retries(
    stops: usize,
    groups: usize,
    max_attempts: usize,
    rng: &mut Rng,
) -> GenerationOutcome {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let assignment = generate_assignment(stops, groups, rng);
        let valid = validate_assignment(&assignment).is_ok();
        if valid || attempts >= max_attempts {
            return GenerationOutcome {
                assignment,
                valid,
                attempts,
            };
        }
    }
}
