//! Shared type definitions for the Parlor chat room.
//!
//! This crate is the single source of truth for the documents stored by
//! the data layer and served by the HTTP API. Types defined here flow
//! downstream to `TypeScript` via `ts-rs` for the chat front end.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for participants and messages
//! - [`enums`] -- The [`MessageType`] enumeration
//! - [`structs`] -- The [`Participant`] and [`Message`] documents

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::MessageType;
pub use ids::{MessageId, ParticipantId};
pub use structs::{Message, Participant};

/// Destination marker meaning "every participant in the room".
///
/// Part of the client contract: front ends render messages addressed to
/// this value as public.
pub const BROADCAST_AUDIENCE: &str = "Todos";

/// Status text recorded when a participant enters the room.
pub const JOIN_STATUS_TEXT: &str = "entra na sala...";

/// Status text recorded when the sweeper evicts a participant.
pub const LEAVE_STATUS_TEXT: &str = "sai da sala...";

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings to `bindings/` relative to the crate
        // root when the exported types are touched.
        use ts_rs::TS;

        let _ = crate::ids::ParticipantId::export_all();
        let _ = crate::ids::MessageId::export_all();
        let _ = crate::enums::MessageType::export_all();
        let _ = crate::structs::Participant::export_all();
        let _ = crate::structs::Message::export_all();
    }
}
