//! # error
//!
//! why: give every rejected call a deterministic, stable reason
//! relations: returned by controller.rs operations, mapped to failure responses by election-host
//! what: ElectionError taxonomy, Operation names for phase violations

use crate::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The mutating operations of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AddCandidate,
    StartVoting,
    Vote,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    /// Caller is not the administrator for an admin-only operation
    #[error("Only Owner.")]
    Unauthorized { caller: Identity },

    /// Operation attempted in the wrong lifecycle phase
    #[error("{}", phase_violation(.operation))]
    InvalidPhase { operation: Operation },

    /// Candidate id outside `[1, num_candidates]`
    #[error("Invalid candidate.")]
    InvalidCandidate { candidate_id: u64 },

    /// Caller's ballot record is already set
    #[error("Already voted.")]
    AlreadyVoted { voter: Identity },

    /// A persisted snapshot breaks one of the controller invariants
    #[error("corrupt election snapshot: {0}")]
    CorruptSnapshot(String),
}

impl ElectionError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidPhase { .. } => "invalid_phase",
            Self::InvalidCandidate { .. } => "invalid_candidate",
            Self::AlreadyVoted { .. } => "already_voted",
            Self::CorruptSnapshot(_) => "corrupt_snapshot",
        }
    }
}

fn phase_violation(operation: &Operation) -> &'static str {
    match operation {
        Operation::AddCandidate => "Voting has already started. Cannot add now.",
        Operation::StartVoting => "Voting has already started.",
        Operation::Vote => "Voting is not active.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_stable() {
        let unauthorized = ElectionError::Unauthorized { caller: Identity::from("mallory") };
        assert_eq!(unauthorized.to_string(), "Only Owner.");

        let phase = ElectionError::InvalidPhase { operation: Operation::AddCandidate };
        assert_eq!(phase.to_string(), "Voting has already started. Cannot add now.");

        let phase = ElectionError::InvalidPhase { operation: Operation::Vote };
        assert_eq!(phase.to_string(), "Voting is not active.");

        assert_eq!(
            ElectionError::InvalidCandidate { candidate_id: 9 }.to_string(),
            "Invalid candidate."
        );
    }

    #[test]
    fn codes_match_kind() {
        assert_eq!(ElectionError::InvalidCandidate { candidate_id: 0 }.code(), "invalid_candidate");
        assert_eq!(
            ElectionError::AlreadyVoted { voter: Identity::from("a") }.code(),
            "already_voted"
        );
        assert_eq!(ElectionError::CorruptSnapshot("x".into()).code(), "corrupt_snapshot");
    }
}
