//! # error
//!
//! why: give every host failure one type with a stable machine-readable code
//! relations: wraps election-core's ElectionError and storage io errors, rendered by host.rs into failure responses
//! what: HostError, code()

use election_core::{ElectionError, Identity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0}")]
    Election(#[from] ElectionError),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("no election found in storage")]
    NotFound,

    #[error("an election already exists in storage")]
    AlreadyExists,

    #[error("stored election is owned by {stored}, not {configured}")]
    OwnerMismatch { stored: Identity, configured: Identity },

    #[error("config error: {0}")]
    Config(String),
}

impl HostError {
    /// Stable machine-readable code, as sent in failure responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Election(e) => e.code(),
            Self::Storage(_) => "storage",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::OwnerMismatch { .. } => "owner_mismatch",
            Self::Config(_) => "config",
        }
    }
}
