//! # host
//!
//! why: give concurrent callers one-operation-at-a-time access to a single election
//! relations: owns an election-core controller and an election-storage backend, used by server.rs
//! what: ElectionHost, EventObserver, commit-then-notify mutation path

use crate::protocol::{Request, Response};
use crate::HostError;
use election_core::{Candidate, ElectionController, ElectionError, ElectionEvent, Identity};
use election_storage::Storage;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Receives every event emitted by a committed mutation, in emission order.
///
/// Observers run while the host lock is held and must not call back into the host.
pub trait EventObserver: Send + Sync {
    fn notify(&self, event: &ElectionEvent);
}

impl<F> EventObserver for F
where
    F: Fn(&ElectionEvent) + Send + Sync,
{
    fn notify(&self, event: &ElectionEvent) {
        self(event)
    }
}

/// Handle returned by [`ElectionHost::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct HostState<S> {
    election: ElectionController,
    storage: S,
    /// entries in the persisted journal that belong to committed state
    journal_len: usize,
    observers: Vec<(ObserverId, Box<dyn EventObserver>)>,
    next_observer: u64,
}

/// A single election behind a mutex.
///
/// Every call locks the whole state, so mutations are globally ordered and reads
/// never see a half-applied change.
pub struct ElectionHost<S: Storage> {
    state: Mutex<HostState<S>>,
}

impl<S: Storage> ElectionHost<S> {
    /// Start a fresh election administered by `administrator`.
    ///
    /// Fails with [`HostError::AlreadyExists`] if `storage` already holds one.
    pub fn create(administrator: Identity, mut storage: S) -> Result<Self, HostError> {
        if storage.load_snapshot()?.is_some() {
            return Err(HostError::AlreadyExists);
        }

        // a journal left behind without a snapshot was never committed
        storage.truncate_events(0)?;
        let election = ElectionController::new(administrator);
        storage.save_snapshot(&election.snapshot())?;
        Ok(Self::with_state(election, storage, 0))
    }

    /// Resume the election held in `storage`
    pub fn open(storage: S) -> Result<Self, HostError> {
        let snapshot = storage.load_snapshot()?.ok_or(HostError::NotFound)?;
        let election = ElectionController::from_snapshot(snapshot)?;
        let journal_len = storage.load_events()?.len();
        info!(
            owner = %election.owner(),
            candidates = election.num_candidates(),
            voters = election.voter_count(),
            journal_len,
            "election resumed"
        );
        Ok(Self::with_state(election, storage, journal_len))
    }

    /// Resume the stored election if there is one, otherwise create it.
    ///
    /// A stored election must belong to `administrator`.
    pub fn open_or_create(administrator: Identity, storage: S) -> Result<Self, HostError> {
        if storage.load_snapshot()?.is_none() {
            return Self::create(administrator, storage);
        }

        let host = Self::open(storage)?;
        let stored = host.owner();
        if stored != administrator {
            return Err(HostError::OwnerMismatch {
                stored,
                configured: administrator,
            });
        }
        Ok(host)
    }

    fn with_state(election: ElectionController, storage: S, journal_len: usize) -> Self {
        Self {
            state: Mutex::new(HostState {
                election,
                storage,
                journal_len,
                observers: Vec::new(),
                next_observer: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState<S>> {
        // mutations commit by swapping in a finished copy, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer for all future events
    pub fn subscribe(&self, observer: impl EventObserver + 'static) -> ObserverId {
        let mut state = self.lock();
        let id = ObserverId(state.next_observer);
        state.next_observer += 1;
        state.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a registered observer. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut state = self.lock();
        let before = state.observers.len();
        state.observers.retain(|(registered, _)| *registered != id);
        state.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    // -- mutations --

    pub fn add_candidate(&self, caller: &Identity, name: impl Into<String>) -> Result<u64, HostError> {
        let name = name.into();
        self.lock().apply(|election| election.add_candidate(caller, name))
    }

    pub fn start_voting(&self, caller: &Identity) -> Result<(), HostError> {
        self.lock().apply(|election| election.start_voting(caller))
    }

    pub fn vote(&self, caller: &Identity, candidate_id: u64) -> Result<(), HostError> {
        self.lock().apply(|election| election.vote(caller, candidate_id))
    }

    // -- reads --

    pub fn owner(&self) -> Identity {
        self.lock().election.owner().clone()
    }

    pub fn voting_active(&self) -> bool {
        self.lock().election.voting_active()
    }

    pub fn num_candidates(&self) -> u64 {
        self.lock().election.num_candidates()
    }

    pub fn candidate(&self, candidate_id: u64) -> Option<Candidate> {
        self.lock().election.candidate(candidate_id).cloned()
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.lock().election.candidates().to_vec()
    }

    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.lock().election.has_voted(voter)
    }

    /// The persisted event journal
    pub fn events(&self) -> Result<Vec<ElectionEvent>, HostError> {
        Ok(self.lock().storage.load_events()?)
    }

    /// Dispatch one protocol request on behalf of `caller`
    pub fn handle(&self, caller: &Identity, request: Request) -> Response {
        let result = match request {
            Request::AddCandidate { name } => self
                .add_candidate(caller, name)
                .map(|candidate_id| Response::CandidateAdded { candidate_id }),
            Request::StartVoting => self.start_voting(caller).map(|()| Response::VotingStarted),
            Request::Vote { candidate_id } => {
                self.vote(caller, candidate_id).map(|()| Response::VoteCast)
            }
            Request::Owner => Ok(Response::Owner {
                owner: self.owner(),
            }),
            Request::VotingActive => Ok(Response::VotingActive {
                active: self.voting_active(),
            }),
            Request::NumCandidates => Ok(Response::NumCandidates {
                count: self.num_candidates(),
            }),
            Request::Candidate { id } => self
                .candidate(id)
                .map(|candidate| Response::Candidate { candidate })
                .ok_or(HostError::Election(ElectionError::InvalidCandidate {
                    candidate_id: id,
                })),
            Request::Candidates => Ok(Response::Candidates {
                candidates: self.candidates(),
            }),
        };

        result.unwrap_or_else(|e| Response::failure(e.code(), e.to_string()))
    }
}

impl<S: Storage> HostState<S> {
    /// Run `op` against a working copy, persist it, then commit and notify.
    ///
    /// Live state is only replaced once storage has accepted the new events and snapshot.
    /// The stored snapshot is authoritative: if the snapshot write fails and the journal
    /// cannot be cut back either, the journal may hold entries for a change that never
    /// committed, but a reopened host still resumes from the previous state.
    fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut ElectionController) -> Result<T, ElectionError>,
    ) -> Result<T, HostError> {
        let mut working = self.election.clone();
        let value = op(&mut working)?;
        let events = working.take_events();

        self.persist(&working, &events)?;
        self.election = working;

        for event in &events {
            for (_, observer) in &self.observers {
                observer.notify(event);
            }
        }
        Ok(value)
    }

    fn persist(&mut self, working: &ElectionController, events: &[ElectionEvent]) -> Result<(), HostError> {
        self.storage.append_events(events)?;

        if let Err(e) = self.storage.save_snapshot(&working.snapshot()) {
            warn!(error = %e, "snapshot write failed, rolling back event journal");
            if let Err(rollback) = self.storage.truncate_events(self.journal_len) {
                warn!(error = %rollback, "could not roll back event journal");
            }
            return Err(e.into());
        }

        self.journal_len += events.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use election_storage::InMemoryStorage;
    use std::sync::{Arc, Mutex};

    fn admin() -> Identity {
        Identity::from("admin")
    }

    #[test]
    fn observers_see_committed_events() {
        let host = ElectionHost::create(admin(), InMemoryStorage::new()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        host.subscribe(move |event: &ElectionEvent| sink.lock().unwrap().push(event.clone()));

        host.add_candidate(&admin(), "a").unwrap();
        let _ = host.add_candidate(&Identity::from("x"), "b");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ElectionEvent::CandidateAdded { name: "a".into() }]
        );
    }

    #[test]
    fn unsubscribed_observer_is_not_notified() {
        let host = ElectionHost::create(admin(), InMemoryStorage::new()).unwrap();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = host.subscribe(move |_: &ElectionEvent| *sink.lock().unwrap() += 1);

        assert!(host.unsubscribe(id));
        assert!(!host.unsubscribe(id));
        host.add_candidate(&admin(), "a").unwrap();

        assert_eq!(*seen.lock().unwrap(), 0);
        assert_eq!(host.observer_count(), 0);
    }

    #[test]
    fn missing_candidate_read_is_invalid_candidate() {
        let host = ElectionHost::create(admin(), InMemoryStorage::new()).unwrap();

        let response = host.handle(&admin(), Request::Candidate { id: 1 });

        assert_eq!(response, Response::failure("invalid_candidate", "Invalid candidate."));
    }
}
