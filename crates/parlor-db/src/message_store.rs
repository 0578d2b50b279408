//! Message log operations on the append-only `messages` table.
//!
//! Rows are ordered by the `seq` column, which preserves insertion order.
//! Nothing in this module updates or deletes a message.

use parlor_types::{BROADCAST_AUDIENCE, Message, MessageId, MessageType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `messages` table.
pub struct MessageStore<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageStore<'a> {
    /// Create a message store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one message.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, message: &Message) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO messages (id, from_name, to_name, text, message_type, time)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id.into_inner())
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.message_type.as_str())
        .bind(&message.time)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Messages addressed to the whole room, addressed to `user`, or sent
    /// by `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn visible_to(&self, user: &str) -> Result<Vec<MessageRow>, DbError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r"SELECT id, from_name, to_name, text, message_type, time
              FROM messages
              WHERE to_name = $1 OR to_name = $2 OR from_name = $2
              ORDER BY seq",
        )
        .bind(BROADCAST_AUDIENCE)
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// A row from the `messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    /// Message identifier.
    pub id: Uuid,
    /// Sender name.
    pub from_name: String,
    /// Destination name or the broadcast marker.
    pub to_name: String,
    /// Body.
    pub text: String,
    /// Message type in its wire form.
    pub message_type: String,
    /// Formatted `HH:MM:SS` time.
    pub time: String,
}

impl TryFrom<MessageRow> for Message {
    type Error = DbError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let message_type = MessageType::from_wire(&row.message_type).ok_or_else(|| {
            DbError::CorruptRow(format!(
                "message {} has unknown type {:?}",
                row.id, row.message_type
            ))
        })?;

        Ok(Self {
            id: MessageId::from(row.id),
            from: row.from_name,
            to: row.to_name,
            text: row.text,
            message_type,
            time: row.time,
        })
    }
}
