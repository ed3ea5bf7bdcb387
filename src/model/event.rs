//! The event aggregate: groups, their host schedule and computed legs.
//! Groups reference each other by arena index in memory and by stable id on
//! the wire; deserialization runs in two phases (instantiate, then resolve).

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::group::{Group, GroupRecord};
use crate::model::participant::Participant;
use crate::planner::assignment::Assignment;
use crate::routing::leg::RouteLeg;

#[derive(Debug)]
pub enum ModelError {
    /// A serialized route referenced a group id that is not in the event.
    UnknownGroupId(Uuid),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGroupId(id) => write!(f, "route references unknown group {id}"),
        }
    }
}

impl std::error::Error for ModelError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventSnapshot", into = "EventSnapshot")]
pub struct Event {
    pub start_address: String,
    pub end_address: String,
    pub start: NaiveDateTime,
    pub time_per_stop_min: i64,
    pub groups: Vec<Group>,
    pub assignment: Option<Assignment>,
}

impl Event {
    pub fn new(
        start_address: impl Into<String>,
        end_address: impl Into<String>,
        start: NaiveDateTime,
        time_per_stop_min: i64,
    ) -> Self {
        Self {
            start_address: start_address.into(),
            end_address: end_address.into(),
            start,
            time_per_stop_min,
            groups: Vec::new(),
            assignment: None,
        }
    }

    pub fn departure_after_minutes(&self, minutes: i64) -> NaiveDateTime {
        self.start + chrono::Duration::minutes(minutes)
    }

    /// Copies the schedule onto each group's route (arena indices).
    pub fn apply_assignment(&mut self, assignment: &Assignment) {
        for (index, row) in assignment.schedule.iter().enumerate() {
            if let Some(group) = self.groups.get_mut(index) {
                group.route = row.clone();
            }
        }
        self.assignment = Some(assignment.clone());
    }

    pub fn total_travel_seconds(&self) -> i64 {
        self.groups
            .iter()
            .filter_map(Group::total_travel_seconds)
            .sum()
    }

    pub fn has_fallback_legs(&self) -> bool {
        self.groups
            .iter()
            .any(|group| group.legs.iter().any(|leg| leg.fallback))
    }

    /// Quick human-readable summary of groups, hosts and routes.
    pub fn render_text(&self) -> String {
        let mut out = String::from("++++ Event ++++\n");
        for (index, group) in self.groups.iter().enumerate() {
            let _ = writeln!(out, "== Group {index} ==");
            let _ = writeln!(out, "Group members: {}", group.member_names());
            let _ = writeln!(
                out,
                "Host: {}",
                group.host().map(|h| h.name.as_str()).unwrap_or("-")
            );
            let route = group
                .route
                .iter()
                .enumerate()
                .map(|(stop, &host_index)| {
                    let host_group = &self.groups[host_index];
                    format!(
                        "{stop}: {} ({})",
                        host_group.host().map(|h| h.name.as_str()).unwrap_or("-"),
                        host_group.host_address().unwrap_or("-")
                    )
                })
                .collect::<Vec<_>>()
                .join(" > ");
            let _ = writeln!(out, "Route: {route}");
        }
        out
    }

    /// Shareable per-group itinerary: structured directions per leg plus the
    /// hosting group at each stop, with a converging marker on the last leg.
    pub fn share_plan(&self, group_index: usize) -> Option<SharePlan> {
        let group = self.groups.get(group_index)?;
        let legs = group
            .legs
            .iter()
            .enumerate()
            .map(|(leg_index, leg)| {
                let host_group = if leg_index < group.route.len() {
                    let hosting = &self.groups[group.route[leg_index]];
                    ShareHost {
                        name: hosting
                            .host()
                            .map(|h| h.name.clone())
                            .unwrap_or_else(|| "-".to_string()),
                        members: hosting.member_names(),
                    }
                } else {
                    ShareHost::finale()
                };
                ShareLeg {
                    leg: leg.clone(),
                    host_group,
                }
            })
            .collect();

        Some(SharePlan {
            start_address: self.start_address.clone(),
            end_address: self.end_address.clone(),
            start_date_time: self.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            group: ShareGroup {
                members: group.members.clone(),
                legs,
            },
        })
    }

    pub fn group_index_by_id(&self, id: Uuid) -> Option<usize> {
        self.groups.iter().position(|group| group.id == id)
    }
}

/// Wire form of an event. Group routes are lists of stable group ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub start_address: String,
    pub end_address: String,
    pub start: NaiveDateTime,
    pub time_per_stop_min: i64,
    pub groups: Vec<GroupRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
}

impl From<Event> for EventSnapshot {
    fn from(event: Event) -> Self {
        let ids: Vec<Uuid> = event.groups.iter().map(|group| group.id).collect();
        let groups = event
            .groups
            .into_iter()
            .map(|group| GroupRecord {
                id: group.id,
                members: group.members,
                route: group.route.iter().map(|&index| ids[index]).collect(),
                legs: group.legs,
            })
            .collect();
        Self {
            start_address: event.start_address,
            end_address: event.end_address,
            start: event.start,
            time_per_stop_min: event.time_per_stop_min,
            groups,
            assignment: event.assignment,
        }
    }
}

impl TryFrom<EventSnapshot> for Event {
    type Error = ModelError;

    fn try_from(snapshot: EventSnapshot) -> Result<Self, Self::Error> {
        // Phase 1: instantiate all groups so every id is known.
        let index_by_id: HashMap<Uuid, usize> = snapshot
            .groups
            .iter()
            .enumerate()
            .map(|(index, record)| (record.id, index))
            .collect();

        // Phase 2: resolve id references into arena indices.
        let mut groups = Vec::with_capacity(snapshot.groups.len());
        for record in snapshot.groups {
            let mut route = Vec::with_capacity(record.route.len());
            for id in record.route {
                let index = index_by_id
                    .get(&id)
                    .copied()
                    .ok_or(ModelError::UnknownGroupId(id))?;
                route.push(index);
            }
            groups.push(Group {
                id: record.id,
                members: record.members,
                route,
                legs: record.legs,
            });
        }

        Ok(Self {
            start_address: snapshot.start_address,
            end_address: snapshot.end_address,
            start: snapshot.start,
            time_per_stop_min: snapshot.time_per_stop_min,
            groups,
            assignment: snapshot.assignment,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePlan {
    pub start_address: String,
    pub end_address: String,
    pub start_date_time: String,
    pub group: ShareGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareGroup {
    pub members: Vec<Participant>,
    pub legs: Vec<ShareLeg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLeg {
    #[serde(flatten)]
    pub leg: RouteLeg,
    pub host_group: ShareHost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareHost {
    pub name: String,
    pub members: String,
}

impl ShareHost {
    /// Terminal marker for the last leg, where all groups converge.
    pub fn finale() -> Self {
        Self {
            name: "Finale".to_string(),
            members: "Everyone".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 9)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    fn event_with_groups(count: usize) -> Event {
        let mut event = Event::new("Start Sq 1", "End Ave 2", sample_start(), 45);
        for index in 0..count {
            let mut group = Group::new();
            let mut host = Participant::new(format!("host-{index}"), Some(format!("Addr {index}")));
            host.is_host = true;
            group.members.push(host);
            group
                .members
                .push(Participant::new(format!("guest-{index}"), None));
            event.groups.push(group);
        }
        event
    }

    #[test]
    fn departure_offsets_add_minutes() {
        let event = event_with_groups(0);
        assert_eq!(
            event.departure_after_minutes(90),
            sample_start() + chrono::Duration::minutes(90)
        );
    }

    #[test]
    fn share_plan_marks_the_final_leg_as_finale() {
        let mut event = event_with_groups(2);
        event.groups[0].route = vec![1];
        event.groups[0].legs = vec![
            RouteLeg::fallback("Start Sq 1", "Addr 1"),
            RouteLeg::fallback("Addr 1", "End Ave 2"),
        ];

        let plan = event.share_plan(0).expect("group 0 exists");
        assert_eq!(plan.group.legs.len(), 2);
        assert_eq!(plan.group.legs[0].host_group.name, "host-1");
        assert_eq!(plan.group.legs[1].host_group.name, "Finale");
        assert_eq!(plan.group.legs[1].host_group.members, "Everyone");
    }

    #[test]
    fn render_text_lists_groups_and_routes() {
        let mut event = event_with_groups(2);
        event.groups[0].route = vec![1];
        event.groups[1].route = vec![1];
        let text = event.render_text();
        assert!(text.contains("== Group 0 =="));
        assert!(text.contains("host-1 (Addr 1)"));
    }

    #[test]
    fn snapshot_rejects_unknown_route_ids() {
        let mut event = event_with_groups(2);
        event.groups[0].route = vec![1];
        let mut snapshot = EventSnapshot::from(event);
        snapshot.groups[0].route = vec![Uuid::new_v4()];
        assert!(Event::try_from(snapshot).is_err());
    }
}
