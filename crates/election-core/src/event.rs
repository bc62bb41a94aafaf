//! # event
//!
//! why: define the notifications a successful operation emits
//! relations: buffered by controller.rs, drained and delivered by election-host, journaled by election-storage
//! what: CandidateAdded, VotingStarted, VoteCast

use serde::{Deserialize, Serialize};

/// Notifications emitted by the election controller.
///
/// Exactly one event is emitted per successful mutating call; rejected calls emit none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElectionEvent {
    /// A candidate was registered
    CandidateAdded { name: String },
    /// The election moved from setup into voting
    VotingStarted,
    /// A ballot was cast
    VoteCast { candidate_id: u64 },
}
