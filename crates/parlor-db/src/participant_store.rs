//! Presence registry operations on the `participants` table.
//!
//! The `participants_name_unique` constraint enforces the one-row-per-name
//! invariant, so joining is a single `INSERT ... ON CONFLICT DO NOTHING`
//! and eviction is a single `DELETE ... RETURNING`.

use parlor_types::{Participant, ParticipantId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `participants` table.
pub struct ParticipantStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ParticipantStore<'a> {
    /// Create a participant store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a participant by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<ParticipantRow>, DbError> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            r"SELECT id, name, last_status FROM participants WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// List all participants in table order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list(&self) -> Result<Vec<ParticipantRow>, DbError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r"SELECT id, name, last_status FROM participants",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert a participant if the name is free. Returns whether a row was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails for any reason
    /// other than the name being taken.
    pub async fn insert_if_absent(&self, participant: &Participant) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"INSERT INTO participants (id, name, last_status)
              VALUES ($1, $2, $3)
              ON CONFLICT ON CONSTRAINT participants_name_unique DO NOTHING",
        )
        .bind(participant.id.into_inner())
        .bind(&participant.name)
        .bind(participant.last_status)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Refresh `last_status` for a participant. Returns whether a row matched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn touch(&self, name: &str, at: i64) -> Result<bool, DbError> {
        let result = sqlx::query(r"UPDATE participants SET last_status = $2 WHERE name = $1")
            .bind(name)
            .bind(at)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every participant with `last_status < cutoff`, returning the
    /// deleted rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete_stale(&self, cutoff: i64) -> Result<Vec<ParticipantRow>, DbError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r"DELETE FROM participants
              WHERE last_status < $1
              RETURNING id, name, last_status",
        )
        .bind(cutoff)
        .fetch_all(self.pool)
        .await?;

        tracing::debug!(count = rows.len(), cutoff, "Deleted stale participants");
        Ok(rows)
    }
}

/// A row from the `participants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    /// Participant identity.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Epoch milliseconds of the last heartbeat.
    pub last_status: i64,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: ParticipantId::from(row.id),
            name: row.name,
            last_status: row.last_status,
        }
    }
}
