//! # Message Router
//!
//! Picks the identifier, record key, and raw value out of a frame's
//! positional payload. Frames with the wrong envelope or a short payload are
//! not relevant to the kind and yield `None`.
//!
//! | Kind | Envelope | Min len | Identifier | Key | Value |
//! |------|----------|---------|------------|-----|-------|
//! | record | `R` / `P` | 4 | `[0]` | `[2]` | `[3]` |
//! | event | `E` / `EVT` | 2 | `[0]` | — | `[1]` |
//! | rpc | `P` / `REQ` | 3 | `[0]` | — | `[2]` |

use crate::message::{Message, MessageKind};

/// The parts of a frame the validation engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extracted<'a> {
    /// Record name, event name, or RPC name.
    pub identifier: &'a str,
    /// Record key; empty for events and RPCs.
    pub key: &'a str,
    /// The still-encoded value.
    pub raw_value: &'a str,
}

/// Extract the validation inputs for `kind` from `message`.
pub fn extract(kind: MessageKind, message: &Message) -> Option<Extracted<'_>> {
    let (topic, action) = kind.envelope();
    if message.topic != topic || message.action != action {
        return None;
    }
    let data = &message.data;
    if data.len() < kind.min_data_len() {
        return None;
    }

    let extracted = match kind {
        MessageKind::Record => Extracted {
            identifier: &data[0],
            key: &data[2],
            raw_value: &data[3],
        },
        MessageKind::Event => Extracted {
            identifier: &data[0],
            key: "",
            raw_value: &data[1],
        },
        MessageKind::Rpc => Extracted {
            identifier: &data[0],
            key: "",
            raw_value: &data[2],
        },
    };
    Some(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_positions() {
        let msg = Message::new("R", "P", ["user/1", "3", "name", "SAda"]);
        let got = extract(MessageKind::Record, &msg).unwrap();
        assert_eq!(got.identifier, "user/1");
        assert_eq!(got.key, "name");
        assert_eq!(got.raw_value, "SAda");
    }

    #[test]
    fn test_event_positions() {
        let msg = Message::new("E", "EVT", ["chat/room", "Shi"]);
        let got = extract(MessageKind::Event, &msg).unwrap();
        assert_eq!(got.identifier, "chat/room");
        assert_eq!(got.key, "");
        assert_eq!(got.raw_value, "Shi");
    }

    #[test]
    fn test_rpc_skips_reserved_slot() {
        let msg = Message::new("P", "REQ", ["add", "corr-1", r#"O{"a":1}"#]);
        let got = extract(MessageKind::Rpc, &msg).unwrap();
        assert_eq!(got.identifier, "add");
        assert_eq!(got.raw_value, r#"O{"a":1}"#);
    }

    #[test]
    fn test_wrong_envelope_is_skipped() {
        let msg = Message::new("R", "CR", ["user/1", "3", "name", "SAda"]);
        assert_eq!(extract(MessageKind::Record, &msg), None);
        let msg = Message::new("E", "EVT", ["chat", "Shi"]);
        assert_eq!(extract(MessageKind::Rpc, &msg), None);
    }

    #[test]
    fn test_short_payload_is_skipped() {
        let msg = Message::new("R", "P", ["user/1", "3", "name"]);
        assert_eq!(extract(MessageKind::Record, &msg), None);
        let msg = Message::new("E", "EVT", ["chat"]);
        assert_eq!(extract(MessageKind::Event, &msg), None);
        let msg = Message::new("P", "REQ", ["add", "corr-1"]);
        assert_eq!(extract(MessageKind::Rpc, &msg), None);
    }

    #[test]
    fn test_extra_positions_are_ignored() {
        let msg = Message::new("E", "EVT", ["chat", "Shi", "extra"]);
        assert_eq!(extract(MessageKind::Event, &msg).unwrap().raw_value, "Shi");
    }
}
