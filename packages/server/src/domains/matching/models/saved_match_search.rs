//! Cached result set of the last completed match search per target.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Bump when the scoring algorithm changes, so stale cache entries are
/// recognizable during staleness checks.
pub const ALGORITHM_VERSION: &str = "cosine-v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_id: Uuid,
    /// Cosine similarity mapped to an integer 0-100.
    pub score: i32,
}

/// One cache entry per target person; overwritten, never merged, by each
/// successful job completion.
#[derive(Debug, Clone, Serialize)]
pub struct SavedMatchSearch {
    pub target_user_id: Uuid,
    pub results: Vec<MatchResult>,
    pub total_candidates_scanned: i32,
    pub algorithm_version: String,
    pub saved_at: DateTime<Utc>,
}

type SavedSearchRow = (Uuid, serde_json::Value, i32, String, DateTime<Utc>);

impl SavedMatchSearch {
    fn from_row(row: SavedSearchRow) -> Result<Self> {
        let (target_user_id, results, total_candidates_scanned, algorithm_version, saved_at) = row;
        Ok(Self {
            target_user_id,
            results: serde_json::from_value(results)?,
            total_candidates_scanned,
            algorithm_version,
            saved_at,
        })
    }

    pub async fn find_for_target(target_user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, SavedSearchRow>(
            "SELECT target_user_id, results, total_candidates_scanned, algorithm_version, saved_at
             FROM saved_match_searches
             WHERE target_user_id = $1",
        )
        .bind(target_user_id)
        .fetch_optional(pool)
        .await?;
        row.map(Self::from_row).transpose()
    }

    /// Overwrite the cache entry for this target inside the caller's
    /// transaction, so the cache write commits together with the job's
    /// completion and a failed job never leaves a partial entry.
    pub async fn upsert_in_tx(&self, tx: &mut Transaction<'_, Postgres>) -> Result<()> {
        sqlx::query(
            "INSERT INTO saved_match_searches
                (target_user_id, results, total_candidates_scanned, algorithm_version, saved_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (target_user_id) DO UPDATE SET
                results = EXCLUDED.results,
                total_candidates_scanned = EXCLUDED.total_candidates_scanned,
                algorithm_version = EXCLUDED.algorithm_version,
                saved_at = EXCLUDED.saved_at",
        )
        .bind(self.target_user_id)
        .bind(serde_json::to_value(&self.results)?)
        .bind(self.total_candidates_scanned)
        .bind(&self.algorithm_version)
        .bind(self.saved_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
