pub mod brute;
pub mod similarity;

pub use brute::BruteForceIndex;
pub use similarity::cosine_similarity;

use std::collections::HashSet;

use tracing::info;

use crate::errors::MatchError;
use crate::store::ProfileStore;
use crate::Role;

/// Nearest-neighbor index over profile embeddings.
///
/// The store owns profile lifecycle; the index holds a read-only
/// id → embedding projection kept eventually consistent through explicit
/// `upsert`/`delete` calls from whoever mutates a profile.
///
/// Implementations must be safe to mutate concurrently with `query`: a
/// query observes some consistent snapshot — it may miss a concurrent
/// write or see a concurrent delete, but never a half-written vector.
/// Approximate implementations must guarantee a stated recall bound
/// relative to exact top-K; `BruteForceIndex` is exact.
pub trait VectorIndex: Send + Sync {
    /// Fixed embedding dimensionality D.
    fn dimension(&self) -> usize;

    /// Number of vectors currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace the vector for `id`.
    /// Fails with `DimensionMismatch` when `vector.len() != D`.
    fn upsert(&self, id: &str, vector: Vec<f32>) -> Result<(), MatchError>;

    /// Remove `id`. Absent ids are a no-op, not an error.
    fn delete(&self, id: &str);

    /// Up to `k` entries by descending cosine similarity, ties broken by
    /// lower id. Fails with `DimensionMismatch` on malformed input and
    /// `EmptyIndex` when zero eligible vectors remain after exclusion.
    fn query(
        &self,
        vector: &[f32],
        k: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<(String, f32)>, MatchError>;
}

/// Repopulate an index from the store. Used on startup when the index is
/// in-memory and the store is durable; profiles without an embedding are
/// skipped.
pub async fn rebuild_from_store(
    store: &dyn ProfileStore,
    index: &dyn VectorIndex,
) -> Result<usize, MatchError> {
    let mut loaded = 0usize;

    for role in [Role::Mentor, Role::Mentee] {
        for id in store.list_eligible(role, true).await? {
            let Some(profile) = store.get(&id).await? else {
                continue;
            };
            if let Some(embedding) = profile.embedding {
                index.upsert(&profile.id, embedding)?;
                loaded += 1;
            }
        }
    }

    info!(loaded, "vector index rebuilt from profile store");
    Ok(loaded)
}
