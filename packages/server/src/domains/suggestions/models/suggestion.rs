use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::domains::suggestions::machines::SuggestionStatus;
use crate::domains::suggestions::models::StatusHistoryEntry;

/// Which side of a suggestion a person is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    First,
    Second,
}

/// Suggestion model - SQL persistence layer.
///
/// `status` is only ever written through [`record_transition`], which is a
/// compare-and-swap: the update applies only if the row is still in the
/// status the caller validated against.
///
/// [`record_transition`]: Suggestion::record_transition
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub first_party_id: Uuid,
    pub second_party_id: Uuid,
    pub matchmaker_id: Uuid,
    pub status: SuggestionStatus,
    pub priority: i32,
    pub internal_note: Option<String>,
    pub note_for_first_party: Option<String>,
    pub note_for_second_party: Option<String>,
    pub decision_deadline: Option<DateTime<Utc>>,
    pub response_deadline: Option<DateTime<Utc>>,
    pub first_party_last_viewed_at: Option<DateTime<Utc>>,
    pub second_party_last_viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Fields supplied by the matchmaker when drafting a suggestion.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewSuggestion {
    pub first_party_id: Uuid,
    pub second_party_id: Uuid,
    pub matchmaker_id: Uuid,
    #[builder(default = 0)]
    pub priority: i32,
    #[builder(default, setter(strip_option))]
    pub internal_note: Option<String>,
    #[builder(default, setter(strip_option))]
    pub note_for_first_party: Option<String>,
    #[builder(default, setter(strip_option))]
    pub note_for_second_party: Option<String>,
    #[builder(default, setter(strip_option))]
    pub decision_deadline: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub response_deadline: Option<DateTime<Utc>>,
}

impl Suggestion {
    /// Which side of this suggestion `person` is on, if any.
    pub fn party_of(&self, person: Uuid) -> Option<Party> {
        if person == self.first_party_id {
            Some(Party::First)
        } else if person == self.second_party_id {
            Some(Party::Second)
        } else {
            None
        }
    }

    /// Whether `person` is a party or the owning matchmaker.
    pub fn involves(&self, person: Uuid) -> bool {
        person == self.matchmaker_id || self.party_of(person).is_some()
    }

    /// Find suggestion by ID.
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM suggestions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find a non-terminal suggestion covering this pair, in either order.
    pub async fn find_active_for_pair(a: Uuid, b: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM suggestions
             WHERE ((first_party_id = $1 AND second_party_id = $2)
                 OR (first_party_id = $2 AND second_party_id = $1))
               AND status NOT IN (
                 'first_party_declined', 'second_party_declined', 'ended_after_first_date',
                 'match_declined', 'married', 'expired', 'closed', 'cancelled'
               )
             LIMIT 1",
        )
        .bind(a)
        .bind(b)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert a new draft suggestion together with its initial history row.
    pub async fn insert(new: NewSuggestion, pool: &PgPool) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let suggestion = sqlx::query_as::<_, Self>(
            "INSERT INTO suggestions (
                id, first_party_id, second_party_id, matchmaker_id, status, priority,
                internal_note, note_for_first_party, note_for_second_party,
                decision_deadline, response_deadline
             )
             VALUES ($1, $2, $3, $4, 'draft', $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(new.first_party_id)
        .bind(new.second_party_id)
        .bind(new.matchmaker_id)
        .bind(new.priority)
        .bind(&new.internal_note)
        .bind(&new.note_for_first_party)
        .bind(&new.note_for_second_party)
        .bind(new.decision_deadline)
        .bind(new.response_deadline)
        .fetch_one(&mut *tx)
        .await?;

        StatusHistoryEntry::insert_in_tx(
            suggestion.id,
            SuggestionStatus::Draft,
            Some("suggestion created"),
            &mut tx,
        )
        .await?;

        tx.commit().await?;
        Ok(suggestion)
    }

    /// Compare-and-swap status update plus history row, in one transaction.
    ///
    /// Returns `None` when the row is no longer in `from`; the caller must
    /// re-read and re-validate rather than overwrite.
    pub async fn record_transition(
        id: Uuid,
        from: SuggestionStatus,
        to: SuggestionStatus,
        note: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query_as::<_, Self>(
            "UPDATE suggestions
             SET status = $2,
                 last_activity = NOW(),
                 closed_at = CASE WHEN $3 THEN NOW() ELSE closed_at END
             WHERE id = $1 AND status = $4
             RETURNING *",
        )
        .bind(id)
        .bind(to)
        .bind(to.is_terminal())
        .bind(from)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Ok(None);
        };

        StatusHistoryEntry::insert_in_tx(id, to, note, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Non-terminal suggestions whose response or decision deadline passed.
    pub async fn find_deadline_passed(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM suggestions
             WHERE status NOT IN (
                 'first_party_declined', 'second_party_declined', 'ended_after_first_date',
                 'match_declined', 'married', 'expired', 'closed', 'cancelled'
               )
               AND (response_deadline < $1 OR decision_deadline < $1)
             ORDER BY created_at",
        )
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Stamp the per-party read marker. Bookkeeping only; not part of the
    /// state machine.
    pub async fn mark_viewed(
        id: Uuid,
        party: Party,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<()> {
        let column = match party {
            Party::First => "first_party_last_viewed_at",
            Party::Second => "second_party_last_viewed_at",
        };
        let query = format!("UPDATE suggestions SET {column} = $2 WHERE id = $1");
        sqlx::query(&query).bind(id).bind(at).execute(pool).await?;
        Ok(())
    }
}
