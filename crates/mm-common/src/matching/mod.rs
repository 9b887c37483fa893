pub mod engine;
pub mod features;
pub mod weights;

pub use engine::{EngineConfig, MatchCandidate, MatchEngine, MatchSet, MatchStatus, ScoreBreakdown};
pub use features::{score_pair, ExperienceFitConfig, FeatureScores};
pub use weights::BlendWeights;
