//! # Error Types
//!
//! Validation failures and configuration defects share one error type,
//! [`ValidationError`], because the bus reports both to the publishing client
//! through the same `INVALID_MESSAGE_DATA` response. The variants keep the
//! cause structured; `Display` renders the exact text sent over the wire.

use thiserror::Error;

/// Why a single message was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The decoded value did not satisfy the resolved schema.
    ///
    /// Only the first violation reported by the schema validator is kept.
    #[error("{path} {reason}")]
    SchemaViolation {
        /// Property path of the violating value, rooted at `message`,
        /// `argument`, or the record key.
        path: String,
        /// Validator message describing the violation.
        reason: String,
    },

    /// A record key that is not listed in `properties` was written while
    /// `additionalProperties` forbids unlisted keys.
    #[error("no such key allowed:{key}")]
    KeyNotAllowed {
        /// The rejected record key.
        key: String,
    },

    /// A record pattern matched but its descriptor has no `properties`
    /// mapping. This is a static configuration defect, reported per message.
    #[error("missing properties in options.{pattern}")]
    MissingProperties {
        /// The configured pattern whose descriptor is incomplete.
        pattern: String,
    },

    /// The schema bound to a matched pattern could not be compiled.
    #[error("invalid schema in options.{pattern}: {reason}")]
    InvalidSchema {
        /// The configured pattern whose schema is invalid.
        pattern: String,
        /// Compiler error text.
        reason: String,
    },
}

impl ValidationError {
    /// The detail text reported back to the originating socket.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true when the error stems from plugin configuration rather
    /// than from the message content.
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Self::MissingProperties { .. } | Self::InvalidSchema { .. }
        )
    }
}

/// A message kind name that is not `record`, `event`, or `rpc`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown message kind '{0}': expected one of record, event, rpc")]
pub struct UnknownKindError(pub String);
