use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domains::suggestions::machines::SuggestionStatus;

/// One row per committed transition. Append-only: rows are never edited or
/// deleted, so ordering by creation time reconstructs the full lifecycle.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub suggestion_id: Uuid,
    pub status: SuggestionStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    /// Append a history row inside the caller's transaction, so the status
    /// update and its log line commit or roll back together.
    pub async fn insert_in_tx(
        suggestion_id: Uuid,
        status: SuggestionStatus,
        note: Option<&str>,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO suggestion_status_history (id, suggestion_id, status, note)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(suggestion_id)
        .bind(status)
        .bind(note)
        .fetch_one(&mut **tx)
        .await
        .map_err(Into::into)
    }

    /// Full lifecycle of a suggestion, oldest first.
    pub async fn find_for_suggestion(suggestion_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM suggestion_status_history
             WHERE suggestion_id = $1
             ORDER BY created_at, id",
        )
        .bind(suggestion_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
