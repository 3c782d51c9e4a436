//! Destination and message types.
//!
//! This module defines:
//! - the kind of broker entity a message is addressed to (queue or topic)
//! - the single outbound message built for a run

use std::fmt;
use std::str::FromStr;

use crate::error::{PushError, Result};

/// Content type attached to every published message.
pub const CONTENT_TYPE: &str = "application/json";

/// Kind of broker entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    /// Point-to-point, one consumer group
    Queue,
    /// Publish/subscribe, independent subscribers
    Topic,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::Queue => "queue",
            DestinationKind::Topic => "topic",
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a destination type is neither `queue` nor `topic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind;

impl FromStr for DestinationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("queue") {
            Ok(DestinationKind::Queue)
        } else if s.eq_ignore_ascii_case("topic") {
            Ok(DestinationKind::Topic)
        } else {
            Err(UnknownKind)
        }
    }
}

/// A validated, trimmed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    name: String,
    kind: DestinationKind,
}

impl Destination {
    pub fn new(name: impl AsRef<str>, kind: DestinationKind) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DestinationKind {
        self.kind
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.name)
    }
}

/// The one message published by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    body: Vec<u8>,
    correlation_id: String,
}

impl OutboundMessage {
    /// Build a JSON message from canonical bytes.
    ///
    /// The body is parsed once more before it is accepted; bytes that are no
    /// longer valid JSON are rejected with [`PushError::BodyParse`].
    pub fn json(body: Vec<u8>, correlation_id: impl Into<String>) -> Result<Self> {
        serde_json::from_slice::<serde_json::Value>(&body).map_err(PushError::BodyParse)?;
        Ok(Self {
            body,
            correlation_id: correlation_id.into(),
        })
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}
