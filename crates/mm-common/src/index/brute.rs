use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use super::similarity::cosine_similarity;
use super::VectorIndex;
use crate::errors::MatchError;

/// Exact nearest-neighbor index: a reader/writer-locked id → vector map
/// with a full scan per query.
///
/// Exactness makes ranking exactly reproducible, and a linear scan is
/// entirely adequate for populations in the low hundreds of thousands.
/// A query scans under the read lock, so it always observes a consistent
/// snapshot; an upsert replaces the `Arc` wholesale rather than writing
/// into a vector a reader could be traversing.
pub struct BruteForceIndex {
    dimension: usize,
    entries: RwLock<BTreeMap<String, Arc<[f32]>>>,
}

impl BruteForceIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    fn check_dimension(&self, len: usize) -> Result<(), MatchError> {
        if len != self.dimension {
            return Err(MatchError::DimensionMismatch {
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }
}

impl VectorIndex for BruteForceIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.read().expect("index lock poisoned").len()
    }

    fn upsert(&self, id: &str, vector: Vec<f32>) -> Result<(), MatchError> {
        self.check_dimension(vector.len())?;
        let mut entries = self.entries.write().expect("index lock poisoned");
        entries.insert(id.to_string(), Arc::from(vector));
        Ok(())
    }

    fn delete(&self, id: &str) {
        let mut entries = self.entries.write().expect("index lock poisoned");
        entries.remove(id);
    }

    fn query(
        &self,
        vector: &[f32],
        k: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<(String, f32)>, MatchError> {
        self.check_dimension(vector.len())?;

        let entries = self.entries.read().expect("index lock poisoned");
        let mut scored: Vec<(String, f32)> = entries
            .iter()
            .filter(|(id, _)| !exclude.contains(id.as_str()))
            .map(|(id, stored)| (id.clone(), cosine_similarity(vector, stored)))
            .collect();
        drop(entries);

        if scored.is_empty() {
            return Err(MatchError::EmptyIndex);
        }

        // BTreeMap iteration is id-ascending already, so a stable sort on
        // similarity keeps the lower id first among ties.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
