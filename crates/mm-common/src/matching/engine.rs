use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::features::{score_pair, ExperienceFitConfig, FeatureScores};
use super::weights::BlendWeights;
use crate::cancel::CancelToken;
use crate::errors::MatchError;
use crate::index::VectorIndex;
use crate::store::ProfileStore;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub weights: BlendWeights,
    /// Shortlist multiplier over the requested top-K; re-ranking shuffles
    /// order, so the index is asked for more than the caller wants.
    pub overfetch_factor: usize,
    /// Shortlist floor so small top-K requests do not starve re-ranking.
    pub min_shortlist: usize,
    pub experience: ExperienceFitConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: BlendWeights::default(),
            overfetch_factor: 3,
            min_shortlist: 20,
            experience: ExperienceFitConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            weights: BlendWeights::from_env(),
            overfetch_factor: env_usize("MM_OVERFETCH_FACTOR", 3),
            min_shortlist: env_usize("MM_MIN_SHORTLIST", 20),
            experience: ExperienceFitConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        self.weights.validate()?;
        self.experience.validate()?;
        if self.overfetch_factor == 0 || self.min_shortlist == 0 {
            return Err(MatchError::Config(
                "overfetch_factor and min_shortlist must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_usize(var: &str, default: usize) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// One ranked candidate. Derived per query, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub candidate_id: String,
    /// Raw cosine similarity in [-1, 1].
    pub similarity: f32,
    pub features: FeatureScores,
    pub blended_score: f64,
}

impl MatchCandidate {
    pub fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            skill: self.features.skill_alignment,
            personality: (f64::from(self.similarity) + 1.0) / 2.0,
            schedule: self.features.schedule_overlap,
            experience: self.features.experience_fit,
            interest: self.features.interest_overlap,
        }
    }
}

/// Per-feature view of a blended score, for explainable results.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreBreakdown {
    pub skill: f64,
    pub personality: f64,
    pub schedule: f64,
    pub experience: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    /// No eligible candidate existed. A normal outcome, not an error.
    NoCandidates,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSet {
    pub status: MatchStatus,
    pub candidates: Vec<MatchCandidate>,
}

impl MatchSet {
    fn no_candidates() -> Self {
        Self {
            status: MatchStatus::NoCandidates,
            candidates: vec![],
        }
    }
}

/// Orchestrates one match request: load, role-filter, shortlist on
/// embedding similarity, re-score with structured features, blend, rank.
/// Stateless across requests; configuration is immutable after
/// construction.
pub struct MatchEngine {
    store: Arc<dyn ProfileStore>,
    index: Arc<dyn VectorIndex>,
    config: EngineConfig,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MatchEngine {
    /// Fails fast with `Config` on invalid weights or shortlist settings.
    pub fn new(
        store: Arc<dyn ProfileStore>,
        index: Arc<dyn VectorIndex>,
        config: EngineConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            store,
            index,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn find_matches(
        &self,
        user_id: &str,
        top_k: usize,
        cancel: &CancelToken,
    ) -> Result<MatchSet, MatchError> {
        cancel.check()?;

        let user = self
            .store
            .get(user_id)
            .await?
            .filter(|p| !p.deactivated)
            .ok_or_else(|| MatchError::ProfileNotFound(user_id.to_string()))?;
        let embedding = user
            .embedding
            .as_deref()
            .ok_or_else(|| MatchError::NoEmbedding(user_id.to_string()))?;

        // Role compatibility is a hard filter, not a weighted feature:
        // everything sharing the querier's role is excluded up front,
        // along with the querier itself.
        let mut exclude: HashSet<String> = self
            .store
            .list_eligible(user.role, false)
            .await?
            .into_iter()
            .collect();
        exclude.insert(user.id.clone());

        let shortlist_k = (top_k * self.config.overfetch_factor).max(self.config.min_shortlist);
        cancel.check()?;

        let shortlist = match self.index.query(embedding, shortlist_k, &exclude) {
            Ok(hits) => hits,
            Err(MatchError::EmptyIndex) => {
                debug!(user_id, "no eligible candidates in index");
                return Ok(MatchSet::no_candidates());
            }
            Err(err) => return Err(err),
        };

        let counterpart = user.role.counterpart();
        let mut ranked: Vec<(MatchCandidate, f32)> = Vec::with_capacity(shortlist.len());

        for (candidate_id, similarity) in shortlist {
            cancel.check()?;

            // The index is eventually consistent with the store; entries
            // that vanished or were tombstoned in between are skipped.
            let Some(candidate) = self.store.get(&candidate_id).await? else {
                continue;
            };
            if candidate.deactivated || candidate.role != counterpart {
                continue;
            }

            let features = score_pair(&user, &candidate, &self.config.experience);
            let blended_score = self.config.weights.blend(&features, similarity);

            ranked.push((
                MatchCandidate {
                    candidate_id,
                    similarity,
                    features,
                    blended_score,
                },
                candidate.reputation_score,
            ));
        }

        if ranked.is_empty() {
            return Ok(MatchSet::no_candidates());
        }

        ranked.sort_by(|(a, rep_a), (b, rep_b)| {
            b.blended_score
                .partial_cmp(&a.blended_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| rep_b.partial_cmp(rep_a).unwrap_or(Ordering::Equal))
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        ranked.truncate(top_k);

        Ok(MatchSet {
            status: MatchStatus::Matched,
            candidates: ranked.into_iter().map(|(candidate, _)| candidate).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::BruteForceIndex;
    use crate::store::MemoryProfileStore;
    use crate::test_fixtures::base_profile;
    use crate::{Profile, Role, Skill};

    fn mentor(id: &str) -> Profile {
        let mut profile = base_profile(id, Role::Mentor);
        profile.skills = vec![Skill::new("Python", 5), Skill::new("ML", 4)];
        profile.availability = vec!["mon".into(), "wed".into()];
        profile.experience_years = 8;
        profile.reputation_score = 4.5;
        profile
    }

    fn mentee(id: &str) -> Profile {
        let mut profile = base_profile(id, Role::Mentee);
        profile.skills = vec![Skill::new("Python", 2)];
        profile.availability = vec!["mon".into(), "fri".into()];
        profile.experience_years = 2;
        profile.reputation_score = 4.0;
        profile
    }

    async fn engine_with(profiles: Vec<(Profile, Vec<f32>)>) -> MatchEngine {
        let store = Arc::new(MemoryProfileStore::new());
        let dimension = profiles
            .first()
            .map(|(_, v)| v.len())
            .unwrap_or(2);
        let index = Arc::new(BruteForceIndex::new(dimension));

        for (mut profile, embedding) in profiles {
            profile.embedding = Some(embedding.clone());
            index.upsert(&profile.id, embedding).unwrap();
            store.put(profile).await.unwrap();
        }

        MatchEngine::new(store, index, EngineConfig::default()).unwrap()
    }

    #[test]
    fn construction_rejects_invalid_weights() {
        let store = Arc::new(MemoryProfileStore::new());
        let index = Arc::new(BruteForceIndex::new(2));
        let mut config = EngineConfig::default();
        config.weights.skill = 0.9;

        let err = MatchEngine::new(store, index, config).unwrap_err();
        assert!(matches!(err, MatchError::Config(_)));
    }

    #[tokio::test]
    async fn unknown_user_fails_with_profile_not_found() {
        let engine = engine_with(vec![(mentor("m1"), vec![1.0, 0.0])]).await;
        let err = engine
            .find_matches("unknown-id", 5, &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn user_without_embedding_fails() {
        let store = Arc::new(MemoryProfileStore::new());
        let mut bare = mentee("t1");
        bare.embedding = None;
        store.put(bare).await.unwrap();

        let index = Arc::new(BruteForceIndex::new(2));
        index.upsert("m1", vec![1.0, 0.0]).unwrap();
        let engine = MatchEngine::new(store, index, EngineConfig::default()).unwrap();

        let err = engine
            .find_matches("t1", 5, &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::NoEmbedding(_)));
    }

    #[tokio::test]
    async fn mentor_never_matches_mentors() {
        let engine = engine_with(vec![
            (mentor("m1"), vec![1.0, 0.0]),
            (mentor("m2"), vec![0.99, 0.01]),
        ])
        .await;

        let result = engine
            .find_matches("m1", 5, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result.status, MatchStatus::NoCandidates);
        assert!(result.candidates.is_empty());
    }

    #[tokio::test]
    async fn querier_is_never_in_its_own_results() {
        let engine = engine_with(vec![
            (mentee("t1"), vec![1.0, 0.0]),
            (mentor("m1"), vec![1.0, 0.0]),
            (mentor("m2"), vec![0.7, 0.3]),
        ])
        .await;

        let result = engine
            .find_matches("t1", 10, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result.status, MatchStatus::Matched);
        assert!(result
            .candidates
            .iter()
            .all(|c| c.candidate_id != "t1"));
    }

    #[tokio::test]
    async fn results_are_bounded_and_non_increasing() {
        let mut profiles = vec![(mentee("t1"), vec![1.0, 0.0])];
        for i in 0..8 {
            let id = format!("m{i}");
            let angle = 0.1 * i as f32;
            profiles.push((mentor(&id), vec![angle.cos(), angle.sin()]));
        }
        let engine = engine_with(profiles).await;

        let result = engine
            .find_matches("t1", 3, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result.candidates.len(), 3);
        assert!(result
            .candidates
            .windows(2)
            .all(|w| w[0].blended_score >= w[1].blended_score));
    }

    #[tokio::test]
    async fn ties_break_on_reputation_then_id() {
        // Identical embeddings and features; only reputation differs.
        let mut strong = mentor("m-strong");
        strong.reputation_score = 5.0;
        let mut weak = mentor("m-weak");
        weak.reputation_score = 1.0;

        let engine = engine_with(vec![
            (mentee("t1"), vec![1.0, 0.0]),
            (weak, vec![1.0, 0.0]),
            (strong, vec![1.0, 0.0]),
        ])
        .await;

        let result = engine
            .find_matches("t1", 2, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result.candidates[0].candidate_id, "m-strong");
        assert_eq!(result.candidates[1].candidate_id, "m-weak");
    }

    #[tokio::test]
    async fn tombstoned_candidates_are_skipped() {
        let mut gone = mentor("m-gone");
        gone.deactivated = true;

        let engine = engine_with(vec![
            (mentee("t1"), vec![1.0, 0.0]),
            (gone, vec![1.0, 0.0]),
            (mentor("m-live"), vec![0.9, 0.1]),
        ])
        .await;

        let result = engine
            .find_matches("t1", 5, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].candidate_id, "m-live");
    }

    #[tokio::test]
    async fn blended_score_matches_manual_computation() {
        let engine = engine_with(vec![
            (mentee("t1"), vec![1.0, 0.0]),
            (mentor("m1"), vec![1.0, 0.0]),
        ])
        .await;

        let result = engine
            .find_matches("t1", 1, &CancelToken::new())
            .await
            .unwrap();
        let top = &result.candidates[0];

        // skill 0.125, personality 1.0, schedule 1/3, experience 1.0
        // (6-year gap), interest 0.0; defaults 0.35/0.25/0.20/0.15/0.05.
        let expected = 0.35 * 0.125 + 0.25 * 1.0 + 0.20 * (1.0 / 3.0) + 0.15 * 1.0 + 0.05 * 0.0;
        assert!((top.blended_score - expected).abs() < 1e-6);

        let breakdown = top.breakdown();
        assert!((breakdown.personality - 1.0).abs() < 1e-6);
        assert!((breakdown.schedule - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn cancelled_token_aborts_the_request() {
        let engine = engine_with(vec![
            (mentee("t1"), vec![1.0, 0.0]),
            (mentor("m1"), vec![1.0, 0.0]),
        ])
        .await;

        let cancel = CancelToken::new();
        cancel.cancel();

        let err = engine.find_matches("t1", 5, &cancel).await.unwrap_err();
        assert!(matches!(err, MatchError::Cancelled));
    }
}
