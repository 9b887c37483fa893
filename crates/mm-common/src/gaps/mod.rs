pub mod taxonomy;

pub use taxonomy::{SkillTaxonomy, TaxonomySkill, TaxonomyTrack};

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::errors::MatchError;
use crate::matching::MatchEngine;
use crate::store::ProfileStore;
use crate::{Profile, Role};

#[derive(Debug, Clone)]
pub struct GapConfig {
    /// How many top matches to consider when recommending mentors.
    pub mentor_pool: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self { mentor_pool: 10 }
    }
}

impl GapConfig {
    pub fn from_env() -> Self {
        Self {
            mentor_pool: std::env::var("MM_GAP_MENTOR_POOL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// One gapped skill with a recommended route to close it.
#[derive(Debug, Clone, Serialize)]
pub struct SkillGap {
    pub skill: String,
    pub current_level: u8,
    pub target_level: u8,
    pub gap: u8,
    pub learning_path: Vec<String>,
    /// Mentors from the current top matches holding the skill at or above
    /// the target level, in match-rank order.
    pub recommended_mentor_ids: Vec<String>,
}

/// Secondary consumer of the store and engine output: compares recorded
/// proficiency against the taxonomy's expectations for the user's desired
/// tier and attaches mentor recommendations from the live match ranking.
pub struct SkillGapAnalyzer {
    store: Arc<dyn ProfileStore>,
    engine: Arc<MatchEngine>,
    taxonomy: SkillTaxonomy,
    config: GapConfig,
}

impl SkillGapAnalyzer {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        engine: Arc<MatchEngine>,
        taxonomy: SkillTaxonomy,
        config: GapConfig,
    ) -> Self {
        Self {
            store,
            engine,
            taxonomy,
            config,
        }
    }

    pub async fn analyze_gaps(
        &self,
        user_id: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<SkillGap>, MatchError> {
        cancel.check()?;

        let user = self
            .store
            .get(user_id)
            .await?
            .filter(|p| !p.deactivated)
            .ok_or_else(|| MatchError::ProfileNotFound(user_id.to_string()))?;

        let mentors = self.mentor_pool(&user, cancel).await?;
        let tier = user.preferences.desired_skill_level;

        // A skill may appear on several relevant tracks; the highest
        // target wins so the gap is never understated.
        let mut targets: HashMap<String, &TaxonomySkill> = HashMap::new();
        for track in self.taxonomy.tracks_for(&user.interests) {
            for skill in &track.skills {
                let key = skill.name.to_lowercase();
                let entry = targets.entry(key).or_insert(skill);
                if skill.expected_levels.for_tier(tier) > entry.expected_levels.for_tier(tier) {
                    *entry = skill;
                }
            }
        }

        let mut gaps: Vec<SkillGap> = targets
            .into_values()
            .filter_map(|skill| {
                let target_level = skill.expected_levels.for_tier(tier);
                let current_level = user.skill_level(&skill.name).unwrap_or(0);
                let gap = target_level.saturating_sub(current_level);
                if gap == 0 {
                    return None;
                }

                let recommended_mentor_ids = mentors
                    .iter()
                    .filter(|mentor| {
                        mentor
                            .skill_level(&skill.name)
                            .is_some_and(|level| level >= target_level)
                    })
                    .map(|mentor| mentor.id.clone())
                    .collect();

                Some(SkillGap {
                    skill: skill.name.clone(),
                    current_level,
                    target_level,
                    gap,
                    learning_path: skill.learning_path.clone(),
                    recommended_mentor_ids,
                })
            })
            .collect();

        gaps.sort_by(|a, b| b.gap.cmp(&a.gap).then_with(|| a.skill.cmp(&b.skill)));
        Ok(gaps)
    }

    /// Top-match mentor profiles in rank order. Only mentee queriers get
    /// recommendations: a mentor's matches are mentees and cannot back
    /// one. A querier without an embedding still gets a gap report, just
    /// with empty recommendations.
    async fn mentor_pool(
        &self,
        user: &Profile,
        cancel: &CancelToken,
    ) -> Result<Vec<Profile>, MatchError> {
        if user.role != Role::Mentee {
            return Ok(vec![]);
        }

        let matches = match self
            .engine
            .find_matches(&user.id, self.config.mentor_pool, cancel)
            .await
        {
            Ok(set) => set.candidates,
            Err(MatchError::NoEmbedding(_)) => {
                debug!(user_id = %user.id, "gap analysis without embedding; skipping recommendations");
                return Ok(vec![]);
            }
            Err(err) => return Err(err),
        };

        let mut mentors = Vec::with_capacity(matches.len());
        for candidate in matches {
            if let Some(profile) = self.store.get(&candidate.candidate_id).await? {
                mentors.push(profile);
            }
        }
        Ok(mentors)
    }
}
