//! # Bus Message Model
//!
//! A [`Message`] is one inbound bus frame: the `topic`/`action` envelope
//! discriminators plus a positional `data` array whose meaning depends on the
//! [`MessageKind`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownKindError;

/// The three message kinds the engine validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A write to one key of a persistent record.
    Record,
    /// A fire-and-forget pub/sub notification.
    Event,
    /// A remote procedure call request.
    Rpc,
}

impl MessageKind {
    /// Returns all kinds in configuration order.
    pub fn all() -> &'static [MessageKind] {
        &[Self::Record, Self::Event, Self::Rpc]
    }

    /// The configuration key and label used for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Event => "event",
            Self::Rpc => "rpc",
        }
    }

    /// The `(topic, action)` pair a frame must carry to be validated as
    /// this kind.
    pub fn envelope(self) -> (&'static str, &'static str) {
        match self {
            Self::Record => ("R", "P"),
            Self::Event => ("E", "EVT"),
            Self::Rpc => ("P", "REQ"),
        }
    }

    /// Minimum length of the positional data array.
    pub fn min_data_len(self) -> usize {
        match self {
            Self::Record => 4,
            Self::Event => 2,
            Self::Rpc => 3,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(Self::Record),
            "event" => Ok(Self::Event),
            "rpc" => Ok(Self::Rpc),
            other => Err(UnknownKindError(other.to_string())),
        }
    }
}

/// One inbound bus frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Topic discriminator, e.g. `R` for records.
    pub topic: String,
    /// Action discriminator, e.g. `P` for a record patch.
    pub action: String,
    /// Positional payload.
    #[serde(default)]
    pub data: Vec<String>,
}

impl Message {
    /// Build a message from its envelope and positional payload.
    pub fn new<I, S>(topic: impl Into<String>, action: impl Into<String>, data: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topic: topic.into(),
            action: action.into(),
            data: data.into_iter().map(Into::into).collect(),
        }
    }
}
