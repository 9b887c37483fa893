use crate::errors::MatchError;
use crate::matching::features::FeatureScores;

/// Blend weights for the final ranking score. "Personality" is proxied by
/// embedding similarity rescaled from [-1,1] to [0,1].
pub const DEFAULT_WEIGHTS: BlendWeights = BlendWeights {
    skill: 0.35,
    personality: 0.25,
    schedule: 0.20,
    experience: 0.15,
    interest: 0.05,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub skill: f64,
    pub personality: f64,
    pub schedule: f64,
    pub experience: f64,
    pub interest: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl BlendWeights {
    pub fn sum(&self) -> f64 {
        self.skill + self.personality + self.schedule + self.experience + self.interest
    }

    /// Weights are configuration, validated once at engine construction:
    /// non-negative and summing to 1 within floating tolerance.
    pub fn validate(&self) -> Result<(), MatchError> {
        let components = [
            self.skill,
            self.personality,
            self.schedule,
            self.experience,
            self.interest,
        ];
        if components.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(MatchError::Config(
                "blend weights must be finite and non-negative".into(),
            ));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(MatchError::Config(format!(
                "blend weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }

    /// Env overrides for individual weights; missing vars keep defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            skill: env_weight("MM_WEIGHT_SKILL", defaults.skill),
            personality: env_weight("MM_WEIGHT_PERSONALITY", defaults.personality),
            schedule: env_weight("MM_WEIGHT_SCHEDULE", defaults.schedule),
            experience: env_weight("MM_WEIGHT_EXPERIENCE", defaults.experience),
            interest: env_weight("MM_WEIGHT_INTEREST", defaults.interest),
        }
    }

    /// Weighted combination of feature scores and raw cosine similarity.
    pub fn blend(&self, features: &FeatureScores, similarity: f32) -> f64 {
        let personality = (f64::from(similarity) + 1.0) / 2.0;
        let score = self.skill * features.skill_alignment
            + self.personality * personality
            + self.schedule * features.schedule_overlap
            + self.experience * features.experience_fit
            + self.interest * features.interest_overlap;
        score.clamp(0.0, 1.0)
    }
}

fn env_weight(var: &str, default: f64) -> f64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
