//! Read side of the per-profile embedding table.
//!
//! Embedding generation is owned by an external collaborator; this model
//! only reads. A row with a NULL embedding means generation has been queued
//! but has not landed yet (`Pending`), which is distinct from having no row
//! at all (`NotFound`).

use anyhow::Result;
use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use crate::kernel::traits::VectorLookup;

#[derive(Debug, Clone)]
pub struct ProfileVector {
    pub profile_id: Uuid,
    pub embedding: Vec<f32>,
}

impl ProfileVector {
    pub async fn find(profile_id: Uuid, pool: &PgPool) -> Result<VectorLookup> {
        let row = sqlx::query_as::<_, (Option<Vector>,)>(
            "SELECT embedding FROM profile_vectors WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_optional(pool)
        .await?;

        Ok(match row {
            None => VectorLookup::NotFound,
            Some((None,)) => VectorLookup::Pending,
            Some((Some(vector),)) => VectorLookup::Ready(vector.to_vec()),
        })
    }

    /// Bulk fetch; profiles without a stored embedding are simply absent
    /// from the result.
    pub async fn find_many(profile_ids: &[Uuid], pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, (Uuid, Vector)>(
            "SELECT profile_id, embedding
             FROM profile_vectors
             WHERE profile_id = ANY($1) AND embedding IS NOT NULL",
        )
        .bind(profile_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(profile_id, vector)| Self {
                profile_id,
                embedding: vector.to_vec(),
            })
            .collect())
    }
}
