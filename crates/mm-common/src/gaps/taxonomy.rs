use std::path::Path;

use serde::Deserialize;

use crate::errors::MatchError;
use crate::SkillTier;

/// Reference skill taxonomy: named tracks, each carrying the skills a
/// learner on that track is expected to hold, with target proficiency per
/// advancement tier and an ordered study path.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillTaxonomy {
    pub tracks: Vec<TaxonomyTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyTrack {
    pub name: String,
    pub skills: Vec<TaxonomySkill>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomySkill {
    pub name: String,
    pub expected_levels: ExpectedLevels,
    #[serde(default)]
    pub learning_path: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExpectedLevels {
    pub beginner: u8,
    pub intermediate: u8,
    pub advanced: u8,
}

impl ExpectedLevels {
    pub fn for_tier(&self, tier: SkillTier) -> u8 {
        match tier {
            SkillTier::Beginner => self.beginner,
            SkillTier::Intermediate => self.intermediate,
            SkillTier::Advanced => self.advanced,
        }
    }
}

impl SkillTaxonomy {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MatchError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|err| MatchError::Config(format!("cannot read taxonomy file: {err}")))?;
        serde_json::from_str(&raw)
            .map_err(|err| MatchError::Config(format!("invalid taxonomy file: {err}")))
    }

    /// Tracks whose name matches one of the given interests,
    /// case-insensitively.
    pub fn tracks_for<'a>(&'a self, interests: &[String]) -> Vec<&'a TaxonomyTrack> {
        self.tracks
            .iter()
            .filter(|track| {
                interests
                    .iter()
                    .any(|interest| interest.eq_ignore_ascii_case(&track.name))
            })
            .collect()
    }
}

impl Default for SkillTaxonomy {
    fn default() -> Self {
        fn skill(
            name: &str,
            levels: (u8, u8, u8),
            path: &[&str],
        ) -> TaxonomySkill {
            TaxonomySkill {
                name: name.into(),
                expected_levels: ExpectedLevels {
                    beginner: levels.0,
                    intermediate: levels.1,
                    advanced: levels.2,
                },
                learning_path: path.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self {
            tracks: vec![
                TaxonomyTrack {
                    name: "AI/ML".into(),
                    skills: vec![
                        skill("Python", (2, 3, 4), &["Syntax and Tooling", "Idiomatic Python", "Scientific Stack"]),
                        skill("Machine Learning", (1, 3, 4), &["Statistics Refresher", "Classical Models", "Model Evaluation"]),
                        skill(
                            "Deep Learning",
                            (1, 2, 4),
                            &["Neural Networks Basics", "TensorFlow/PyTorch", "CNN Architecture", "Advanced Optimization"],
                        ),
                        skill("Data Science", (1, 3, 4), &["Exploratory Analysis", "Feature Engineering", "Experiment Design"]),
                    ],
                },
                TaxonomyTrack {
                    name: "Web Development".into(),
                    skills: vec![
                        skill("JavaScript", (2, 3, 4), &["Language Fundamentals", "Async Patterns", "Tooling"]),
                        skill("React", (1, 3, 4), &["Components and Hooks", "State Management", "Performance"]),
                        skill("System Design", (1, 2, 3), &["Scalability Principles", "Database Design", "Caching Strategies", "Microservices"]),
                    ],
                },
                TaxonomyTrack {
                    name: "Data Engineering".into(),
                    skills: vec![
                        skill("Redis", (1, 2, 4), &["Data Structures", "Persistence Models", "Cluster Operations"]),
                        skill("System Design", (1, 3, 4), &["Scalability Principles", "Database Design", "Caching Strategies", "Microservices"]),
                        skill("DevOps", (1, 2, 3), &["CI Pipelines", "Containers", "Observability"]),
                    ],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_taxonomy_levels_are_in_range() {
        let taxonomy = SkillTaxonomy::default();
        assert!(!taxonomy.tracks.is_empty());
        for track in &taxonomy.tracks {
            for skill in &track.skills {
                for tier in [SkillTier::Beginner, SkillTier::Intermediate, SkillTier::Advanced] {
                    let level = skill.expected_levels.for_tier(tier);
                    assert!((1..=5).contains(&level), "{}: {level}", skill.name);
                }
                assert!(
                    skill.expected_levels.beginner <= skill.expected_levels.advanced,
                    "{} tiers must not regress",
                    skill.name
                );
            }
        }
    }

    #[test]
    fn tracks_match_interests_case_insensitively() {
        let taxonomy = SkillTaxonomy::default();
        let tracks = taxonomy.tracks_for(&["web development".into(), "Gardening".into()]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "Web Development");
    }

    #[test]
    fn taxonomy_parses_from_json() {
        let raw = r#"{
            "tracks": [{
                "name": "Rust",
                "skills": [{
                    "name": "Ownership",
                    "expected_levels": {"beginner": 2, "intermediate": 3, "advanced": 5}
                }]
            }]
        }"#;
        let taxonomy: SkillTaxonomy = serde_json::from_str(raw).unwrap();
        assert_eq!(taxonomy.tracks[0].skills[0].name, "Ownership");
        assert!(taxonomy.tracks[0].skills[0].learning_path.is_empty());
    }
}
