use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::participant::Participant;
use crate::routing::leg::RouteLeg;

/// One crawl group. `route` holds indices into the owning event's group
/// arena, one entry per stop; the serialized form replaces them with group
/// ids (see `EventSnapshot`) so no cyclic references are ever embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: Uuid,
    pub members: Vec<Participant>,
    pub route: Vec<usize>,
    pub legs: Vec<RouteLeg>,
}

impl Group {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            members: Vec::new(),
            route: Vec::new(),
            legs: Vec::new(),
        }
    }

    pub fn host(&self) -> Option<&Participant> {
        self.members.iter().find(|member| member.is_host)
    }

    pub fn host_address(&self) -> Option<&str> {
        self.host().and_then(|host| host.address.as_deref())
    }

    pub fn member_names(&self) -> String {
        self.members
            .iter()
            .map(|member| member.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Total travel over computed legs; `None` before legs are computed.
    pub fn total_travel_seconds(&self) -> Option<i64> {
        if self.legs.is_empty() {
            return None;
        }
        Some(self.legs.iter().map(RouteLeg::duration_seconds).sum())
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized form of a group: routes as stable ids, host via member flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub members: Vec<Participant>,
    #[serde(default)]
    pub route: Vec<Uuid>,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_resolves_from_member_flags() {
        let mut group = Group::new();
        group.members.push(Participant::new("Ana", None));
        let mut hosting = Participant::new("Ben", Some("Canal St 5".to_string()));
        hosting.is_host = true;
        group.members.push(hosting);

        assert_eq!(group.host().map(|h| h.name.as_str()), Some("Ben"));
        assert_eq!(group.host_address(), Some("Canal St 5"));
    }

    #[test]
    fn travel_time_is_none_until_legs_exist() {
        let mut group = Group::new();
        assert_eq!(group.total_travel_seconds(), None);
        group.legs.push(RouteLeg::fallback("a", "b"));
        assert_eq!(group.total_travel_seconds(), Some(0));
    }
}
