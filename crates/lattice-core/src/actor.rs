// SPDX-License-Identifier: MIT
//! Actor strings (`<prefix>:<identifier>`), validated per spec §3.1/§4.3.

use crate::error::{LatticeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated `<prefix>:<identifier>` actor string, e.g. `human:alice`
/// or `agent:claude-session-7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Actor {
    prefix: String,
    identifier: String,
}

impl Actor {
    /// Parse and validate an actor string. Both halves of the `prefix:identifier`
    /// split must be non-empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((prefix, identifier)) = raw.split_once(':') else {
            return Err(LatticeError::InvalidActor(format!(
                "actor '{raw}' is missing a ':' separator"
            )));
        };
        if prefix.is_empty() || identifier.is_empty() {
            return Err(LatticeError::InvalidActor(format!(
                "actor '{raw}' must have a non-empty prefix and identifier"
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            identifier: identifier.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn as_string(&self) -> String {
        format!("{}:{}", self.prefix, self.identifier)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.identifier)
    }
}

impl TryFrom<String> for Actor {
    type Error = LatticeError;

    fn try_from(value: String) -> Result<Self> {
        Actor::parse(&value)
    }
}

impl From<Actor> for String {
    fn from(actor: Actor) -> Self {
        actor.as_string()
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
