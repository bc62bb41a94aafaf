//! # controller
//!
//! why: define the election state machine and its phase transitions
//! relations: uses candidate.rs for the registry, event.rs for notifications, error.rs for rejections
//! what: Phase enum, ElectionController, ElectionSnapshot for persistence

use crate::{Candidate, ElectionError, ElectionEvent, Identity, Operation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// The two lifecycle phases of an election
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Candidates may be registered, no ballots accepted
    #[default]
    Setup,
    /// Ballots accepted, registry frozen. Never left once entered.
    Voting,
}

/// A single election.
///
/// All mutation goes through [`add_candidate`](Self::add_candidate),
/// [`start_voting`](Self::start_voting) and [`vote`](Self::vote). Each call either
/// applies fully and buffers exactly one [`ElectionEvent`], or fails and leaves the
/// controller untouched.
#[derive(Debug, Clone)]
pub struct ElectionController {
    owner: Identity,
    phase: Phase,
    candidates: Vec<Candidate>,
    ballots: HashMap<Identity, bool>,
    pending_events: Vec<ElectionEvent>,
}

impl ElectionController {
    /// Create a new election in Setup, administered by `owner`
    pub fn new(owner: Identity) -> Self {
        info!(owner = %owner, "election created");
        Self {
            owner,
            phase: Phase::Setup,
            candidates: Vec::new(),
            ballots: HashMap::new(),
            pending_events: Vec::new(),
        }
    }

    /// Register a candidate and return its id.
    ///
    /// Names are taken as-is: empty and duplicate names are accepted.
    pub fn add_candidate(
        &mut self,
        caller: &Identity,
        name: impl Into<String>,
    ) -> Result<u64, ElectionError> {
        self.ensure_owner(caller)?;
        self.ensure_phase(Phase::Setup, Operation::AddCandidate)?;

        let name = name.into();
        let id = self.candidates.len() as u64 + 1;
        self.candidates.push(Candidate::new(id, name.clone()));
        info!(candidate_id = id, name = %name, "candidate added");

        self.pending_events.push(ElectionEvent::CandidateAdded { name });
        Ok(id)
    }

    /// Close registration and open the ballot. Rejected once voting is open.
    pub fn start_voting(&mut self, caller: &Identity) -> Result<(), ElectionError> {
        self.ensure_owner(caller)?;
        self.ensure_phase(Phase::Setup, Operation::StartVoting)?;

        self.phase = Phase::Voting;
        info!(candidates = self.candidates.len(), "voting started");

        self.pending_events.push(ElectionEvent::VotingStarted);
        Ok(())
    }

    /// Cast `caller`'s single ballot for `candidate_id`.
    ///
    /// Checks run in a fixed order: phase, then candidate range, then ballot record.
    pub fn vote(&mut self, caller: &Identity, candidate_id: u64) -> Result<(), ElectionError> {
        self.ensure_phase(Phase::Voting, Operation::Vote)?;

        let index = match self.index_of(candidate_id) {
            Some(index) => index,
            None => {
                debug!(candidate_id, "rejected vote for unknown candidate");
                return Err(ElectionError::InvalidCandidate { candidate_id });
            }
        };

        if self.has_voted(caller) {
            debug!(voter = %caller, "rejected second ballot");
            return Err(ElectionError::AlreadyVoted {
                voter: caller.clone(),
            });
        }

        self.ballots.insert(caller.clone(), true);
        self.candidates[index].vote_count += 1;
        info!(voter = %caller, candidate_id, "vote cast");

        self.pending_events.push(ElectionEvent::VoteCast { candidate_id });
        Ok(())
    }

    // -- read accessors --

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn voting_active(&self) -> bool {
        self.phase == Phase::Voting
    }

    pub fn num_candidates(&self) -> u64 {
        self.candidates.len() as u64
    }

    /// Look up a candidate by its 1-based id
    pub fn candidate(&self, candidate_id: u64) -> Option<&Candidate> {
        self.index_of(candidate_id).map(|index| &self.candidates[index])
    }

    /// All candidates in id order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Whether `voter` has cast a ballot; unseen identities have not
    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.ballots.get(voter).copied().unwrap_or(false)
    }

    /// Number of identities whose ballot record is set
    pub fn voter_count(&self) -> usize {
        self.ballots.values().filter(|voted| **voted).count()
    }

    /// Sum of vote counts over all candidates
    pub fn total_votes(&self) -> u64 {
        // bounded by the voter count for any controller that passed validation
        vote_total(&self.candidates).unwrap_or(u64::MAX)
    }

    /// Drain the notifications emitted since the last call, oldest first
    pub fn take_events(&mut self) -> Vec<ElectionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // -- persistence --

    /// Capture the full election state. Pending events are not part of it.
    pub fn snapshot(&self) -> ElectionSnapshot {
        let mut voters: Vec<Identity> = self
            .ballots
            .iter()
            .filter(|(_, voted)| **voted)
            .map(|(voter, _)| voter.clone())
            .collect();
        voters.sort();

        ElectionSnapshot {
            owner: self.owner.clone(),
            phase: self.phase,
            candidates: self.candidates.clone(),
            voters,
        }
    }

    /// Rebuild a controller from a snapshot, rejecting any that break the invariants
    pub fn from_snapshot(snapshot: ElectionSnapshot) -> Result<Self, ElectionError> {
        snapshot.validate()?;

        let ballots = snapshot.voters.into_iter().map(|voter| (voter, true)).collect();
        debug!(owner = %snapshot.owner, phase = ?snapshot.phase, "election restored");

        Ok(Self {
            owner: snapshot.owner,
            phase: snapshot.phase,
            candidates: snapshot.candidates,
            ballots,
            pending_events: Vec::new(),
        })
    }

    // -- helpers --

    fn ensure_owner(&self, caller: &Identity) -> Result<(), ElectionError> {
        if caller != &self.owner {
            debug!(caller = %caller, "rejected admin call from non-owner");
            return Err(ElectionError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn ensure_phase(&self, required: Phase, operation: Operation) -> Result<(), ElectionError> {
        if self.phase != required {
            debug!(?operation, phase = ?self.phase, "rejected call in wrong phase");
            return Err(ElectionError::InvalidPhase { operation });
        }
        Ok(())
    }

    fn index_of(&self, candidate_id: u64) -> Option<usize> {
        let index = usize::try_from(candidate_id).ok()?.checked_sub(1)?;
        (index < self.candidates.len()).then_some(index)
    }
}

/// Serializable form of an election, as written by election-storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSnapshot {
    pub owner: Identity,
    pub phase: Phase,
    pub candidates: Vec<Candidate>,
    /// Identities whose ballot record is set, sorted
    pub voters: Vec<Identity>,
}

impl ElectionSnapshot {
    fn validate(&self) -> Result<(), ElectionError> {
        for (position, candidate) in self.candidates.iter().enumerate() {
            if candidate.id != position as u64 + 1 {
                return Err(ElectionError::CorruptSnapshot(format!(
                    "candidate at position {} has id {}",
                    position + 1,
                    candidate.id
                )));
            }
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.voters.iter().find(|voter| !seen.insert(*voter)) {
            return Err(ElectionError::CorruptSnapshot(format!(
                "voter {duplicate} recorded twice"
            )));
        }

        let total = vote_total(&self.candidates).ok_or_else(|| {
            ElectionError::CorruptSnapshot("vote total overflows".to_string())
        })?;
        if self.phase == Phase::Setup && (total > 0 || !self.voters.is_empty()) {
            return Err(ElectionError::CorruptSnapshot(
                "votes recorded before voting started".to_string(),
            ));
        }
        if total != self.voters.len() as u64 {
            return Err(ElectionError::CorruptSnapshot(format!(
                "{total} votes counted for {} voters",
                self.voters.len()
            )));
        }

        Ok(())
    }
}

/// Checked sum of vote counts, `None` on overflow
fn vote_total(candidates: &[Candidate]) -> Option<u64> {
    candidates
        .iter()
        .try_fold(0u64, |acc, c| acc.checked_add(c.vote_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::from("admin")
    }

    #[test]
    fn new_election_starts_in_setup() {
        let election = ElectionController::new(admin());
        assert_eq!(election.phase(), Phase::Setup);
        assert!(!election.voting_active());
        assert_eq!(election.num_candidates(), 0);
        assert_eq!(election.owner(), &admin());
    }

    #[test]
    fn candidate_ids_are_sequential() {
        let mut election = ElectionController::new(admin());
        assert_eq!(election.add_candidate(&admin(), "a").unwrap(), 1);
        assert_eq!(election.add_candidate(&admin(), "b").unwrap(), 2);
        assert_eq!(election.candidate(2).unwrap().name, "b");
    }

    #[test]
    fn snapshot_restores_state() {
        let mut election = ElectionController::new(admin());
        election.add_candidate(&admin(), "a").unwrap();
        election.start_voting(&admin()).unwrap();
        election.vote(&Identity::from("v1"), 1).unwrap();

        let restored = ElectionController::from_snapshot(election.snapshot()).unwrap();
        assert!(restored.voting_active());
        assert!(restored.has_voted(&Identity::from("v1")));
        assert_eq!(restored.candidate(1).unwrap().vote_count, 1);
    }
}
