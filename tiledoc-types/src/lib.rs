//! Shared types for tiledoc
//!
//! This crate provides the small vocabulary shared by the core pipeline and
//! the renderers: topic identifiers and the protocol classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Topic identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicId(pub String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(id: &str) -> Self {
        TopicId(id.to_string())
    }
}

/// Transport semantics of a protocol topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Bytestream,
    Message,
    Application,
}

impl Protocol {
    /// Every accepted classification, in declaration order
    pub const ALL: [Protocol; 3] = [
        Protocol::Bytestream,
        Protocol::Message,
        Protocol::Application,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Bytestream => "bytestream",
            Protocol::Message => "message",
            Protocol::Application => "application",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown protocol: {0}")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bytestream" => Ok(Protocol::Bytestream),
            "message" => Ok(Protocol::Message),
            "application" => Ok(Protocol::Application),
            _ => Err(UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
