//! Pure candidate scoring.
//!
//! No side effects here: given the same target and candidate vectors these
//! functions return the same ranking, with ties broken by ascending
//! candidate id. That determinism is what the job runner and the tests
//! rely on.

use uuid::Uuid;

use crate::domains::matching::models::{MatchResult, ProfileVector};

/// Result sets are capped to bound response size.
pub const TOP_N_RESULTS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate_id: Uuid,
    pub similarity: f64,
    pub score: i32,
}

impl ScoredCandidate {
    pub fn into_match_result(self) -> MatchResult {
        MatchResult {
            candidate_id: self.candidate_id,
            score: self.score,
        }
    }
}

/// Cosine similarity between two vectors. `None` when the dimensions differ
/// or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Map a cosine similarity to the integer 0-100 scale used in results.
pub fn similarity_score(similarity: f64) -> i32 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as i32
}

/// Score every candidate against the target, rank by similarity descending
/// with ascending-id tie-break, and cap at `top_n`. Candidates whose vector
/// cannot be compared (dimension mismatch, zero magnitude) are dropped.
pub fn rank_candidates(
    target: &[f32],
    candidates: &[ProfileVector],
    top_n: usize,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .filter_map(|candidate| {
            cosine_similarity(target, &candidate.embedding).map(|similarity| ScoredCandidate {
                candidate_id: candidate.profile_id,
                similarity,
                score: similarity_score(similarity),
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });
    scored.truncate(top_n);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: u128, embedding: Vec<f32>) -> ProfileVector {
        ProfileVector {
            profile_id: Uuid::from_u128(id),
            embedding,
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-9);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn scores_clamp_to_the_percentage_scale() {
        assert_eq!(similarity_score(1.0), 100);
        assert_eq!(similarity_score(0.854), 85);
        assert_eq!(similarity_score(0.0), 0);
        // Opposite-direction vectors floor at zero rather than going negative.
        assert_eq!(similarity_score(-0.7), 0);
    }

    #[test]
    fn ranking_orders_by_similarity_descending() {
        let target = [1.0, 0.0];
        let candidates = vec![
            profile(1, vec![0.7, 0.7]),
            profile(2, vec![0.95, 0.1]),
            profile(3, vec![0.0, 1.0]),
        ];
        let ranked = rank_candidates(&target, &candidates, TOP_N_RESULTS);
        let ids: Vec<_> = ranked.iter().map(|c| c.candidate_id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(2), Uuid::from_u128(1), Uuid::from_u128(3)]
        );
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn ties_break_by_ascending_candidate_id() {
        let target = [1.0, 0.0];
        let candidates = vec![
            profile(9, vec![2.0, 0.0]),
            profile(3, vec![5.0, 0.0]),
            profile(7, vec![1.0, 0.0]),
        ];
        let ranked = rank_candidates(&target, &candidates, TOP_N_RESULTS);
        let ids: Vec<_> = ranked.iter().map(|c| c.candidate_id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(3), Uuid::from_u128(7), Uuid::from_u128(9)]
        );
    }

    #[test]
    fn ranking_is_deterministic_across_calls() {
        let target = [0.3, 0.8, 0.5];
        let candidates: Vec<ProfileVector> = (0..40)
            .map(|i| profile(i, vec![i as f32 * 0.1, 0.5, 1.0 - i as f32 * 0.01]))
            .collect();
        let first = rank_candidates(&target, &candidates, TOP_N_RESULTS);
        let second = rank_candidates(&target, &candidates, TOP_N_RESULTS);
        assert_eq!(first, second);
        assert_eq!(first.len(), TOP_N_RESULTS);
    }

    #[test]
    fn incomparable_candidates_are_dropped() {
        let target = [1.0, 0.0];
        let candidates = vec![profile(1, vec![1.0]), profile(2, vec![1.0, 0.5])];
        let ranked = rank_candidates(&target, &candidates, TOP_N_RESULTS);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate_id, Uuid::from_u128(2));
    }
}
