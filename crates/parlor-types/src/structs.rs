//! Document structs for the Parlor chat room.
//!
//! Covers the two stored documents: [`Participant`] (presence registry)
//! and [`Message`] (message log). Field names on the wire follow the
//! chat client contract (`lastStatus`, `type`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::MessageType;
use crate::ids::{MessageId, ParticipantId};

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// An active participant in the room.
///
/// At most one participant per `name` exists at any time. The document is
/// created on join, its `last_status` refreshed on every heartbeat, and it
/// is removed by the inactivity sweeper once the heartbeat goes stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Identity of this occupancy of the name.
    pub id: ParticipantId,
    /// Display name, unique among active participants (case-sensitive).
    pub name: String,
    /// Epoch milliseconds of the last heartbeat (or of the join).
    #[serde(rename = "lastStatus")]
    pub last_status: i64,
}

impl Participant {
    /// Create a freshly joined participant with a new identity.
    pub fn new(name: impl Into<String>, joined_at: i64) -> Self {
        Self {
            id: ParticipantId::new(),
            name: name.into(),
            last_status: joined_at,
        }
    }

    /// Whether the last heartbeat happened strictly before `cutoff`.
    pub const fn is_stale(&self, cutoff: i64) -> bool {
        self.last_status < cutoff
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// An entry in the append-only message log.
///
/// `from` and `to` reference participants by name only, so a message
/// outlives the participants it mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Name of the sender.
    pub from: String,
    /// Destination: [`BROADCAST_AUDIENCE`](crate::BROADCAST_AUDIENCE) or a
    /// participant name.
    pub to: String,
    /// Free-form body.
    pub text: String,
    /// Kind of log entry.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Wall-clock time of the write, formatted `HH:MM:SS`.
    pub time: String,
}

impl Message {
    /// Build a message with a fresh id.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        message_type: MessageType,
        time: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            from: from.into(),
            to: to.into(),
            text: text.into(),
            message_type,
            time: time.into(),
        }
    }

    /// Build a presence event addressed to the whole room.
    pub fn status(from: impl Into<String>, text: impl Into<String>, time: impl Into<String>) -> Self {
        Self::new(
            from,
            crate::BROADCAST_AUDIENCE,
            text,
            MessageType::Status,
            time,
        )
    }

    /// Whether `user` may read this message.
    ///
    /// A message is visible when it is addressed to the whole room, when
    /// it is addressed to `user`, or when `user` sent it.
    pub fn is_visible_to(&self, user: &str) -> bool {
        self.to == crate::BROADCAST_AUDIENCE || self.to == user || self.from == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BROADCAST_AUDIENCE;

    #[test]
    fn participant_serializes_last_status_in_camel_case() {
        let participant = Participant::new("alice", 1_700_000_000_000);
        let json = serde_json::to_value(&participant).unwrap_or_default();
        assert_eq!(json["name"], "alice");
        assert_eq!(json["lastStatus"], 1_700_000_000_000_i64);
        assert!(json.get("last_status").is_none());
    }

    #[test]
    fn stale_is_strictly_before_cutoff() {
        let participant = Participant::new("alice", 1_000);
        assert!(participant.is_stale(1_001));
        assert!(!participant.is_stale(1_000));
        assert!(!participant.is_stale(999));
    }

    #[test]
    fn message_serializes_type_field() {
        let message = Message::new("alice", "bob", "hi", MessageType::PrivateMessage, "12:00:00");
        let json = serde_json::to_value(&message).unwrap_or_default();
        assert_eq!(json["type"], "private_message");
        assert_eq!(json["time"], "12:00:00");
    }

    #[test]
    fn status_messages_go_to_everyone() {
        let message = Message::status("alice", crate::JOIN_STATUS_TEXT, "08:30:05");
        assert_eq!(message.to, BROADCAST_AUDIENCE);
        assert_eq!(message.message_type, MessageType::Status);
    }

    #[test]
    fn visibility_rules() {
        let public = Message::new("alice", BROADCAST_AUDIENCE, "hi", MessageType::Message, "t");
        let private = Message::new("alice", "bob", "psst", MessageType::PrivateMessage, "t");

        assert!(public.is_visible_to("carol"));
        assert!(private.is_visible_to("bob"));
        assert!(private.is_visible_to("alice"));
        assert!(!private.is_visible_to("carol"));
    }

    #[test]
    fn new_participants_get_distinct_identities() {
        let first = Participant::new("alice", 0);
        let second = Participant::new("alice", 0);
        assert_ne!(first.id, second.id);
    }
}
