//! # candidate
//!
//! why: represent a registered option on the ballot
//! relations: stored in order by controller.rs, returned by host read requests
//! what: Candidate struct with stable id, name and running vote count

use serde::{Deserialize, Serialize};

/// A registered candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Position in the registry (1-indexed, dense)
    pub id: u64,
    /// Display name, never validated or changed after registration
    pub name: String,
    /// Number of ballots cast for this candidate
    pub vote_count: u64,
}

impl Candidate {
    /// Create a new candidate with no votes
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vote_count: 0,
        }
    }
}
