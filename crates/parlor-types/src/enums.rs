//! Enumeration types for the Parlor chat room.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The kind of entry recorded in the message log.
///
/// Serialized in `snake_case` (`status`, `message`, `private_message`),
/// which is the representation clients send and receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MessageType {
    /// A presence event (entered or left the room). Only the server
    /// writes these.
    Status,
    /// A message posted by a participant.
    Message,
    /// A message posted by a participant and meant for its recipient only.
    PrivateMessage,
}

impl MessageType {
    /// Every message type, in declaration order.
    pub const ALL: [Self; 3] = [Self::Status, Self::Message, Self::PrivateMessage];

    /// Return the wire representation of this type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Message => "message",
            Self::PrivateMessage => "private_message",
        }
    }

    /// Parse the wire representation produced by [`MessageType::as_str`].
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Whether participants may post messages of this type themselves.
    pub const fn is_user_sendable(self) -> bool {
        matches!(self, Self::Message | Self::PrivateMessage)
    }
}

impl core::fmt::Display for MessageType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
