//! # identity
//!
//! why: name the callers of the election, administrator included
//! relations: keys the ballot record in controller.rs, carried by every host request
//! what: Identity newtype over an opaque string

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque caller identity as supplied by the hosting runtime.
///
/// No format is imposed; two identities are the same caller iff their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_serializes_as_plain_string() {
        let id = Identity::from("voter-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"voter-1\"");
        assert_eq!(id.to_string(), "voter-1");
    }
}
