//! Per-trial pipeline: form groups, derive a validated schedule, elect
//! hosts, then price the event leg by leg through the routing client.
//! Routing stays strictly sequential; the provider is rate limited.

use crate::model::{Event, Participant};
use crate::planner::assignment::generate_with_retries;
use crate::planner::grouping::{form_groups, set_random_hosts, GroupingError};
use crate::planner::rng::Rng;
use crate::planner::PlanConfig;
use crate::routing::leg::RouteLeg;
use crate::routing::provider::RouteProvider;
use crate::routing::Router;

pub const NOTE_DEGRADED_ASSIGNMENT: &str = "degraded assignment";
pub const NOTE_FALLBACK_LEGS: &str = "fallback legs";

/// A trial after the pure phase: groups formed, hosts elected, schedule
/// applied. No routing has happened yet.
#[derive(Debug, Clone)]
pub struct PreparedTrial {
    pub event: Event,
    pub notes: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub event: Event,
    pub total_seconds: i64,
    pub notes: Vec<&'static str>,
}

/// Pure phase of one trial. Safe to run in parallel across trials.
pub fn prepare_trial(
    config: &PlanConfig,
    participants: &[Participant],
    rng: &mut Rng,
) -> Result<PreparedTrial, GroupingError> {
    let mut groups = form_groups(
        participants,
        config.group_count,
        config.max_grouping_attempts,
        rng,
    )?;
    set_random_hosts(&mut groups, rng);

    let generation = generate_with_retries(
        config.stop_count,
        config.group_count,
        config.max_assignment_attempts,
        rng,
    );
    let mut notes = Vec::new();
    if !generation.valid {
        eprintln!(
            "warning: no valid schedule within {} attempts for {} groups / {} stops; \
             proceeding with last candidate",
            generation.attempts, config.group_count, config.stop_count
        );
        notes.push(NOTE_DEGRADED_ASSIGNMENT);
    }

    let mut event = Event::new(
        config.start_address.clone(),
        config.end_address.clone(),
        config.start,
        config.time_per_stop_min,
    );
    event.groups = groups;
    event.apply_assignment(&generation.assignment);

    Ok(PreparedTrial { event, notes })
}

/// Routing phase: computes every group's legs in order, substituting a
/// zero-duration fallback for any leg the provider cannot resolve.
/// Returns whether any fallback was used.
pub fn compute_legs<P: RouteProvider>(event: &mut Event, router: &mut Router<P>) -> bool {
    let mut used_fallback = false;

    for group_index in 0..event.groups.len() {
        let hops = leg_requests(event, group_index);
        let mut legs = Vec::with_capacity(hops.len());
        for (origin, destination, offset_min) in hops {
            let departure = event.departure_after_minutes(offset_min);
            let leg = match (origin.as_deref(), destination.as_deref()) {
                (Some(origin), Some(destination)) => {
                    match router.route(origin, destination, departure) {
                        Ok(leg) => leg,
                        Err(err) => {
                            eprintln!("warning: {err}; using zero-duration fallback");
                            used_fallback = true;
                            RouteLeg::fallback(origin, destination)
                        }
                    }
                }
                _ => {
                    // A host without an address should have been caught by
                    // group formation; degrade the same way as a failed call.
                    eprintln!("warning: missing address on leg; using zero-duration fallback");
                    used_fallback = true;
                    RouteLeg::fallback(
                        origin.as_deref().unwrap_or(""),
                        destination.as_deref().unwrap_or(""),
                    )
                }
            };
            legs.push(leg);
        }
        event.groups[group_index].legs = legs;
    }

    used_fallback
}

/// (origin, destination, departure offset in minutes) per leg:
/// start -> first host, host[i-1] -> host[i], last host -> end.
fn leg_requests(event: &Event, group_index: usize) -> Vec<(Option<String>, Option<String>, i64)> {
    let group = &event.groups[group_index];
    let host_address = |stop: usize| -> Option<String> {
        group
            .route
            .get(stop)
            .and_then(|&host_index| event.groups.get(host_index))
            .and_then(|host_group| host_group.host_address())
            .map(str::to_string)
    };

    let stops = group.route.len();
    let mut requests = Vec::with_capacity(stops + 1);
    if stops == 0 {
        return requests;
    }

    requests.push((Some(event.start_address.clone()), host_address(0), 0));
    for stop in 1..stops {
        requests.push((
            host_address(stop - 1),
            host_address(stop),
            stop as i64 * event.time_per_stop_min,
        ));
    }
    requests.push((
        host_address(stops - 1),
        Some(event.end_address.clone()),
        stops as i64 * event.time_per_stop_min,
    ));
    requests
}

/// One complete trial: pure phase plus routing plus score.
pub fn run_trial<P: RouteProvider>(
    config: &PlanConfig,
    participants: &[Participant],
    router: &mut Router<P>,
    rng: &mut Rng,
) -> Result<TrialOutcome, GroupingError> {
    let prepared = prepare_trial(config, participants, rng)?;
    Ok(price_trial(prepared, router))
}

pub fn price_trial<P: RouteProvider>(
    prepared: PreparedTrial,
    router: &mut Router<P>,
) -> TrialOutcome {
    let PreparedTrial { mut event, mut notes } = prepared;
    if compute_legs(&mut event, router) {
        notes.push(NOTE_FALLBACK_LEGS);
    }
    let total_seconds = event.total_travel_seconds();
    TrialOutcome {
        event,
        total_seconds,
        notes,
    }
}
