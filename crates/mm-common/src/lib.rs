pub mod cancel;
pub mod db;
pub mod embed;
pub mod errors;
pub mod gaps;
pub mod index;
pub mod logging;
pub mod matching;
pub mod notify;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Commonly used data models for the matching engine.

/// Which side of a mentorship a profile sits on. Mentors are only ever
/// matched against mentees and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    Mentee,
}

impl Role {
    pub fn counterpart(self) -> Role {
        match self {
            Role::Mentor => Role::Mentee,
            Role::Mentee => Role::Mentor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
        }
    }
}

/// A named skill with a self-reported proficiency level (1..=5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: u8,
}

impl Skill {
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillTier {
    Beginner,
    Intermediate,
    Advanced,
}

impl Default for SkillTier {
    fn default() -> Self {
        SkillTier::Beginner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingFrequency {
    Weekly,
    Biweekly,
    Monthly,
}

impl Default for MeetingFrequency {
    fn default() -> Self {
        MeetingFrequency::Weekly
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    Formal,
    Casual,
    Mixed,
}

impl Default for CommunicationStyle {
    fn default() -> Self {
        CommunicationStyle::Mixed
    }
}

/// Structured matching preferences attached to a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub desired_skill_level: SkillTier,
    #[serde(default)]
    pub meeting_frequency: MeetingFrequency,
    #[serde(default)]
    pub communication_style: CommunicationStyle,
}

/// One user record. The embedding is optional: a profile without one stays
/// in the store but never enters the vector index. `deactivated` is the
/// tombstone flag; tombstoned profiles are retained for audit and excluded
/// from matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub reputation_score: f32,
    #[serde(default)]
    pub deactivated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Profile {
    /// Recorded proficiency for a skill, matched case-insensitively.
    pub fn skill_level(&self, skill: &str) -> Option<u8> {
        self.skills
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(skill))
            .map(|s| s.level)
    }

    /// Text payload handed to the embedding provider.
    pub fn embedding_text(&self) -> String {
        let skills = self
            .skills
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let interests = self.interests.join(", ");
        format!(
            "{} {} Skills: {} Interests: {}",
            self.name, self.bio, skills, interests
        )
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_counterpart_flips_sides() {
        assert_eq!(Role::Mentor.counterpart(), Role::Mentee);
        assert_eq!(Role::Mentee.counterpart(), Role::Mentor);
    }

    #[test]
    fn skill_level_lookup_is_case_insensitive() {
        let mut profile = test_fixtures::base_profile("u1", Role::Mentee);
        profile.skills = vec![Skill::new("Python", 3)];

        assert_eq!(profile.skill_level("python"), Some(3));
        assert_eq!(profile.skill_level("Rust"), None);
    }

    #[test]
    fn embedding_text_includes_skills_and_interests() {
        let mut profile = test_fixtures::base_profile("u1", Role::Mentor);
        profile.name = "Sarah".into();
        profile.bio = "AI researcher".into();
        profile.skills = vec![Skill::new("ML", 5), Skill::new("Python", 4)];
        profile.interests = vec!["AI Ethics".into()];

        let text = profile.embedding_text();
        assert!(text.contains("Sarah"));
        assert!(text.contains("ML, Python"));
        assert!(text.contains("AI Ethics"));
    }

    #[test]
    fn profile_round_trips_through_json() {
        let mut profile = test_fixtures::base_profile("u1", Role::Mentee);
        profile.embedding = Some(vec![0.1, 0.2]);
        profile.preferences.desired_skill_level = SkillTier::Advanced;

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["role"], "mentee");
        assert_eq!(value["preferences"]["desired_skill_level"], "advanced");

        let back: Profile = serde_json::from_value(value).unwrap();
        assert_eq!(back, profile);
    }
}
