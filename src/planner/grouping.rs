//! Partitions the participant pool into balanced groups. Every group needs
//! at least one member with an address, otherwise nobody can host; the
//! shuffle is retried a bounded number of times before giving up.

use std::fmt;

use crate::model::{Group, Participant};
use crate::planner::rng::Rng;

pub const DEFAULT_GROUPING_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupingError {
    /// No shuffle produced host-eligible groups within the retry budget.
    /// The pool cannot support the requested group count.
    Exhausted {
        group_count: usize,
        addressed_participants: usize,
        attempts: usize,
    },
}

impl fmt::Display for GroupingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted {
                group_count,
                addressed_participants,
                attempts,
            } => write!(
                f,
                "could not form {group_count} groups with a host each after {attempts} attempts \
                 ({addressed_participants} participants have an address)"
            ),
        }
    }
}

impl std::error::Error for GroupingError {}

/// Shuffles participants and deals them round-robin into `group_count`
/// groups, reshuffling until every group has an address-eligible member.
pub fn form_groups(
    participants: &[Participant],
    group_count: usize,
    max_attempts: usize,
    rng: &mut Rng,
) -> Result<Vec<Group>, GroupingError> {
    let mut shuffled: Vec<Participant> = participants.to_vec();
    rng.shuffle(&mut shuffled);

    for _ in 0..max_attempts {
        let mut groups: Vec<Group> = (0..group_count).map(|_| Group::new()).collect();
        for (index, participant) in shuffled.iter().enumerate() {
            groups[index % group_count].members.push(participant.clone());
        }

        if groups
            .iter()
            .all(|group| group.members.iter().any(Participant::has_address))
        {
            return Ok(groups);
        }
        rng.shuffle(&mut shuffled);
    }

    Err(GroupingError::Exhausted {
        group_count,
        addressed_participants: participants
            .iter()
            .filter(|participant| participant.has_address())
            .count(),
        attempts: max_attempts,
    })
}

/// Elects one addressed member per group as host, uniformly at random,
/// clearing any stale host flags first.
pub fn set_random_hosts(groups: &mut [Group], rng: &mut Rng) {
    for group in groups {
        for member in &mut group.members {
            member.is_host = false;
        }
        let eligible: Vec<usize> = group
            .members
            .iter()
            .enumerate()
            .filter(|(_, member)| member.has_address())
            .map(|(index, _)| index)
            .collect();
        if eligible.is_empty() {
            continue;
        }
        let chosen = eligible[rng.index(eligible.len())];
        group.members[chosen].is_host = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(total: usize, addressed: usize) -> Vec<Participant> {
        (0..total)
            .map(|index| {
                let address = (index < addressed).then(|| format!("Street {index}"));
                Participant::new(format!("p{index}"), address)
            })
            .collect()
    }

    #[test]
    fn partitions_round_robin_into_balanced_groups() {
        let mut rng = Rng::new(5);
        let groups = form_groups(&pool(10, 10), 3, 10, &mut rng).expect("grouping succeeds");
        let sizes: Vec<usize> = groups.iter().map(|group| group.members.len()).collect();
        let mut sorted = sizes.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![3, 3, 4]);
    }

    #[test]
    fn every_group_gets_an_addressed_member() {
        for seed in 0..20 {
            let mut rng = Rng::new(seed);
            let groups = form_groups(&pool(12, 6), 6, 1000, &mut rng).expect("grouping succeeds");
            assert!(groups
                .iter()
                .all(|group| group.members.iter().any(Participant::has_address)));
        }
    }

    #[test]
    fn exhausts_when_pool_cannot_support_group_count() {
        // 6 groups need 6 hosts; only 5 participants have an address.
        let mut rng = Rng::new(1);
        let err = form_groups(&pool(6, 5), 6, 50, &mut rng).unwrap_err();
        assert_eq!(
            err,
            GroupingError::Exhausted {
                group_count: 6,
                addressed_participants: 5,
                attempts: 50,
            }
        );
    }

    #[test]
    fn host_election_clears_previous_flags() {
        let mut rng = Rng::new(9);
        let mut groups = form_groups(&pool(8, 8), 2, 10, &mut rng).expect("grouping succeeds");
        for _ in 0..3 {
            set_random_hosts(&mut groups, &mut rng);
            for group in &groups {
                assert_eq!(
                    group.members.iter().filter(|member| member.is_host).count(),
                    1
                );
                assert!(group.host().expect("host elected").has_address());
            }
        }
    }
}
