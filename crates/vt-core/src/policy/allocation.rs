//! Allocation results.

use serde::{Deserialize, Serialize};

/// Per-patient result of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationOutcome {
    GrantedSurvived,
    GrantedDied,
    Denied,
}

impl AllocationOutcome {
    pub fn is_granted(&self) -> bool {
        !matches!(self, AllocationOutcome::Denied)
    }

    pub(crate) fn granted(alive: bool) -> Self {
        if alive {
            AllocationOutcome::GrantedSurvived
        } else {
            AllocationOutcome::GrantedDied
        }
    }
}

/// One policy applied to one cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Priority order over patient indices, highest priority first.
    pub order: Vec<usize>,
    /// Outcome per patient, aligned to cohort order.
    pub outcomes: Vec<AllocationOutcome>,
}

impl Allocation {
    pub fn granted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_granted()).count()
    }

    pub fn lives_saved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| **o == AllocationOutcome::GrantedSurvived)
            .count()
    }

    /// Indices of granted patients in cohort order.
    pub fn granted_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_granted())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_granted(&self, patient: usize) -> bool {
        self.outcomes
            .get(patient)
            .map(AllocationOutcome::is_granted)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_outcomes() {
        let allocation = Allocation {
            order: vec![2, 0, 1],
            outcomes: vec![
                AllocationOutcome::GrantedDied,
                AllocationOutcome::Denied,
                AllocationOutcome::GrantedSurvived,
            ],
        };
        assert_eq!(allocation.granted_count(), 2);
        assert_eq!(allocation.lives_saved(), 1);
        assert_eq!(allocation.granted_indices(), vec![0, 2]);
        assert!(!allocation.is_granted(1));
        assert!(!allocation.is_granted(9));
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&AllocationOutcome::GrantedSurvived).expect("serialize");
        assert_eq!(json, "\"granted_survived\"");
    }
}
