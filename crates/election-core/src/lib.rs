//! # election-core
//!
//! why: implement the single-election state machine in pure, portable rust
//! relations: used by election-host for serialized request handling, election-storage for persistence
//! what: controller, phase control, candidate registry, ballot records, events, errors

pub mod candidate;
pub mod controller;
pub mod error;
pub mod event;
pub mod identity;

pub use candidate::Candidate;
pub use controller::{ElectionController, ElectionSnapshot, Phase};
pub use error::{ElectionError, Operation};
pub use event::ElectionEvent;
pub use identity::Identity;
