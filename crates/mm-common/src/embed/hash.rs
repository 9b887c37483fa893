use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

use super::{EmbedConfig, EmbeddingProvider};
use crate::errors::MatchError;

/// Fixed seeds for deterministic hashing.
/// Changing either value changes every embedding; bump `version()` with it.
const HASH_SEED_K0: u64 = 0x6d61_7463_685f_6d6d;
const HASH_SEED_K1: u64 = 0x7631_5f68_6173_6800;

/// Deterministic feature-hashing embedder.
///
/// - No model, no training: tokens hash straight into dimensions.
/// - Sign hashing keeps the expected dot-product of unrelated texts near 0.
/// - SipHash-1-3 with fixed seeds keeps vectors stable across processes
///   and Rust versions.
pub struct HashEmbedder {
    config: EmbedConfig,
}

impl HashEmbedder {
    pub fn new(config: EmbedConfig) -> Self {
        let mut cfg = config;
        cfg.dimension = cfg.dimension.max(1);
        Self { config: cfg }
    }

    fn hash_token(&self, token: &str) -> usize {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.config.dimension
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 2)
            .map(|t| t.to_lowercase())
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn version(&self) -> &str {
        "v1"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        let mut vector = vec![0.0f32; self.config.dimension];

        for token in Self::tokenize(text) {
            let idx = self.hash_token(&token);
            // Sign hashing: even hash of "<token>_sign" adds, odd subtracts.
            let sign = if self.hash_token(&format!("{token}_sign")) % 2 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[idx] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    fn embedder() -> HashEmbedder {
        HashEmbedder::new(EmbedConfig::default())
    }

    #[test]
    fn produces_unit_vectors() {
        let emb = embedder().embed("rust systems engineering").unwrap();
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "L2 norm should be 1.0, got {norm}");
    }

    #[test]
    fn identical_text_is_deterministic() {
        let a = embedder().embed("machine learning with python").unwrap();
        let b = embedder().embed("machine learning with python").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlapping_texts_score_higher_than_disjoint() {
        let e = embedder();
        let base = e.embed("python machine learning data science").unwrap();
        let close = e.embed("python data science pipelines").unwrap();
        let far = e.embed("cobol mainframe accounting").unwrap();

        let close_sim = cosine_similarity(&base, &close);
        let far_sim = cosine_similarity(&base, &far);
        assert!(
            close_sim > far_sim,
            "overlap should win: {close_sim} vs {far_sim}"
        );
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let emb = embedder().embed("").unwrap();
        assert!(emb.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn dimension_is_clamped_to_at_least_one() {
        let e = HashEmbedder::new(EmbedConfig { dimension: 0 });
        assert_eq!(e.dimension(), 1);
    }
}
