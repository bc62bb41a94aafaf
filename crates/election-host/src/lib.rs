//! # election-host
//!
//! why: run one election behind a serialized request interface
//! relations: wraps election-core's controller, persists through election-storage, driven by the electiond binary
//! what: ElectionHost, request/response protocol, line server, config, logging

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod protocol;
pub mod server;

pub use config::HostConfig;
pub use error::HostError;
pub use host::{ElectionHost, EventObserver, ObserverId};
pub use logging::{init_logging, LogFormat};
pub use protocol::{Envelope, Request, Response};
pub use server::serve;
