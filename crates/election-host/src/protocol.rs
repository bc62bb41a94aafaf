//! # protocol
//!
//! why: define the request/response messages a hosting runtime exchanges with the election
//! relations: dispatched by host.rs, read and written line-by-line by server.rs
//! what: Envelope, Request, Response

use election_core::{Candidate, Identity};
use serde::{Deserialize, Serialize};

/// A request together with the identity it is made on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub caller: Identity,
    pub request: Request,
}

/// Every operation the election exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Register a candidate (administrator, setup only)
    AddCandidate { name: String },
    /// Open the ballot (administrator, setup only)
    StartVoting,
    /// Cast the caller's ballot
    Vote { candidate_id: u64 },
    Owner,
    VotingActive,
    NumCandidates,
    Candidate { id: u64 },
    Candidates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    CandidateAdded { candidate_id: u64 },
    VotingStarted,
    VoteCast,
    Owner { owner: Identity },
    VotingActive { active: bool },
    NumCandidates { count: u64 },
    Candidate { candidate: Candidate },
    Candidates { candidates: Vec<Candidate> },
    /// The request was rejected and had no effect
    Failure { code: String, reason: String },
}

impl Response {
    pub fn failure(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failure {
            code: code.into(),
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_from_json() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"caller":"voter1","request":{"op":"vote","candidate_id":2}}"#,
        )
        .unwrap();

        assert_eq!(envelope.caller, Identity::from("voter1"));
        assert_eq!(envelope.request, Request::Vote { candidate_id: 2 });
    }

    #[test]
    fn unit_requests_need_only_op() {
        let request: Request = serde_json::from_str(r#"{"op":"start_voting"}"#).unwrap();
        assert_eq!(request, Request::StartVoting);
    }

    #[test]
    fn failure_serializes_with_status() {
        let json = serde_json::to_value(Response::failure("already_voted", "Already voted.")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["code"], "already_voted");
        assert_eq!(json["reason"], "Already voted.");
    }
}
