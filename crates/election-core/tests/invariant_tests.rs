//! Property tests: arbitrary call sequences never break the ballot invariants.

use election_core::{ElectionController, Identity};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Call {
    AddCandidate { caller: u8, name: String },
    StartVoting { caller: u8 },
    Vote { caller: u8, candidate_id: u64 },
}

/// Caller 0 is the owner; the small range makes repeat voters likely
fn arb_call() -> impl Strategy<Value = Call> {
    prop_oneof![
        (0u8..3, "[a-z]{0,6}").prop_map(|(caller, name)| Call::AddCandidate { caller, name }),
        (0u8..3).prop_map(|caller| Call::StartVoting { caller }),
        (0u8..8, 0u64..6).prop_map(|(caller, candidate_id)| Call::Vote { caller, candidate_id }),
    ]
}

fn identity(caller: u8) -> Identity {
    Identity::new(format!("id{caller}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn vote_sum_equals_voter_count(calls in prop::collection::vec(arb_call(), 0..60)) {
        let mut election = ElectionController::new(identity(0));

        for call in calls {
            let before = election.snapshot();
            let result = match call {
                Call::AddCandidate { caller, name } => {
                    election.add_candidate(&identity(caller), name).map(|_| ())
                }
                Call::StartVoting { caller } => election.start_voting(&identity(caller)),
                Call::Vote { caller, candidate_id } => election.vote(&identity(caller), candidate_id),
            };

            let events = election.take_events();
            if result.is_err() {
                prop_assert_eq!(election.snapshot(), before);
                prop_assert!(events.is_empty());
            } else {
                prop_assert_eq!(events.len(), 1);
            }

            prop_assert_eq!(election.total_votes(), election.voter_count() as u64);
            for (position, candidate) in election.candidates().iter().enumerate() {
                prop_assert_eq!(candidate.id, position as u64 + 1);
            }
            prop_assert_eq!(election.owner(), &identity(0));
        }
    }

    #[test]
    fn registry_frozen_once_voting_opens(
        names in prop::collection::vec("[a-z]{1,4}", 0..5),
        late in "[a-z]{1,4}",
    ) {
        let owner = identity(0);
        let mut election = ElectionController::new(owner.clone());
        for name in &names {
            election.add_candidate(&owner, name.clone()).unwrap();
        }
        election.start_voting(&owner).unwrap();

        prop_assert!(election.add_candidate(&owner, late).is_err());
        prop_assert_eq!(election.num_candidates(), names.len() as u64);
        prop_assert!(election.voting_active());
    }
}
