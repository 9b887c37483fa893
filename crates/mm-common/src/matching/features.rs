use std::collections::HashSet;

use serde::Serialize;

use crate::errors::MatchError;
use crate::{Profile, Role};

/// Shape of the experience-gap fit curve: zero at or below no gap, linear
/// rise to a plateau of 1.0 across the ideal band, linear falloff beyond
/// it. All values in years of mentor experience over the mentee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperienceFitConfig {
    pub ideal_gap_min: f64,
    pub ideal_gap_max: f64,
    pub falloff_years: f64,
}

impl Default for ExperienceFitConfig {
    fn default() -> Self {
        Self {
            ideal_gap_min: 3.0,
            ideal_gap_max: 7.0,
            falloff_years: 7.0,
        }
    }
}

impl ExperienceFitConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(self.ideal_gap_min > 0.0
            && self.ideal_gap_max >= self.ideal_gap_min
            && self.falloff_years > 0.0)
        {
            return Err(MatchError::Config(format!(
                "experience fit requires 0 < ideal_gap_min <= ideal_gap_max and falloff_years > 0, \
                 got min={} max={} falloff={}",
                self.ideal_gap_min, self.ideal_gap_max, self.falloff_years
            )));
        }
        Ok(())
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ideal_gap_min: env_f64("MM_EXPERIENCE_GAP_MIN", defaults.ideal_gap_min),
            ideal_gap_max: env_f64("MM_EXPERIENCE_GAP_MAX", defaults.ideal_gap_max),
            falloff_years: env_f64("MM_EXPERIENCE_FALLOFF", defaults.falloff_years),
        }
    }
}

fn env_f64(var: &str, default: f64) -> f64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Structured sub-scores for one candidate pair, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeatureScores {
    pub skill_alignment: f64,
    pub schedule_overlap: f64,
    pub experience_fit: f64,
    pub interest_overlap: f64,
}

/// Compute all structured feature scores between two profiles. Pure: no
/// I/O, inputs untouched.
pub fn score_pair(a: &Profile, b: &Profile, config: &ExperienceFitConfig) -> FeatureScores {
    FeatureScores {
        skill_alignment: skill_alignment(a, b),
        schedule_overlap: jaccard(&fold_set(&a.availability), &fold_set(&b.availability)),
        experience_fit: experience_fit(mentor_gap(a, b), config),
        interest_overlap: jaccard(&fold_set(&a.interests), &fold_set(&b.interests)),
    }
}

/// Proficiency-weighted skill overlap: skills held by both sides
/// contribute `1 - |level_a - level_b| / 4`, skills held by one side
/// contribute 0, averaged over the union.
fn skill_alignment(a: &Profile, b: &Profile) -> f64 {
    let mut union: HashSet<String> = HashSet::new();
    for skill in a.skills.iter().chain(b.skills.iter()) {
        union.insert(skill.name.to_lowercase());
    }
    if union.is_empty() {
        return 0.0;
    }

    let shared: f64 = union
        .iter()
        .filter_map(|name| match (a.skill_level(name), b.skill_level(name)) {
            (Some(la), Some(lb)) => {
                Some(1.0 - f64::from(la.abs_diff(lb)) / 4.0)
            }
            _ => None,
        })
        .sum();

    shared / union.len() as f64
}

/// Mentor-minus-mentee experience gap in years. With two same-role
/// profiles (the engine's hard filter makes this unreachable in practice)
/// the absolute difference is used.
fn mentor_gap(a: &Profile, b: &Profile) -> f64 {
    let (a_years, b_years) = (f64::from(a.experience_years), f64::from(b.experience_years));
    match (a.role, b.role) {
        (Role::Mentor, Role::Mentee) => a_years - b_years,
        (Role::Mentee, Role::Mentor) => b_years - a_years,
        _ => (a_years - b_years).abs(),
    }
}

fn experience_fit(gap: f64, config: &ExperienceFitConfig) -> f64 {
    if gap <= 0.0 {
        return 0.0;
    }
    if gap < config.ideal_gap_min {
        return gap / config.ideal_gap_min;
    }
    if gap <= config.ideal_gap_max {
        return 1.0;
    }
    let over = gap - config.ideal_gap_max;
    (1.0 - over / config.falloff_years).max(0.0)
}

fn fold_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::base_profile;
    use crate::Skill;
    use approx::assert_relative_eq;

    fn mentor() -> Profile {
        let mut profile = base_profile("m1", Role::Mentor);
        profile.skills = vec![Skill::new("Python", 5), Skill::new("ML", 4)];
        profile.availability = vec!["mon".into(), "wed".into()];
        profile.experience_years = 8;
        profile
    }

    fn mentee() -> Profile {
        let mut profile = base_profile("t1", Role::Mentee);
        profile.skills = vec![Skill::new("Python", 2)];
        profile.availability = vec!["mon".into(), "fri".into()];
        profile.experience_years = 2;
        profile
    }

    #[test]
    fn identical_skill_sets_align_exactly() {
        let mut a = mentor();
        let mut b = mentee();
        a.skills = vec![Skill::new("Rust", 3), Skill::new("SQL", 4)];
        b.skills = a.skills.clone();

        assert_eq!(skill_alignment(&a, &b), 1.0);
    }

    #[test]
    fn partial_overlap_matches_hand_computed_value() {
        // Union {python, ml}; python contributes 1 - 3/4, ml contributes 0.
        let alignment = skill_alignment(&mentor(), &mentee());
        assert_relative_eq!(alignment, 0.125, epsilon = 1e-9);
    }

    #[test]
    fn no_skills_on_either_side_scores_zero() {
        let mut a = mentor();
        let mut b = mentee();
        a.skills.clear();
        b.skills.clear();
        assert_eq!(skill_alignment(&a, &b), 0.0);
    }

    #[test]
    fn schedule_overlap_is_jaccard_of_slots() {
        let scores = score_pair(&mentor(), &mentee(), &ExperienceFitConfig::default());
        // {mon} over {mon, wed, fri}.
        assert_relative_eq!(scores.schedule_overlap, 1.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_availability_scores_exactly_zero() {
        let mut a = mentor();
        let mut b = mentee();
        a.availability = vec!["mon".into()];
        b.availability = vec!["tue".into()];
        let scores = score_pair(&a, &b, &ExperienceFitConfig::default());
        assert_eq!(scores.schedule_overlap, 0.0);
    }

    #[test]
    fn empty_availability_scores_zero() {
        let mut a = mentor();
        a.availability.clear();
        let scores = score_pair(&a, &mentee(), &ExperienceFitConfig::default());
        assert_eq!(scores.schedule_overlap, 0.0);
    }

    #[test]
    fn experience_fit_trapezoid_corners() {
        let config = ExperienceFitConfig::default();

        assert_eq!(experience_fit(0.0, &config), 0.0);
        assert_eq!(experience_fit(-2.0, &config), 0.0);
        assert_relative_eq!(experience_fit(1.5, &config), 0.5, epsilon = 1e-9);
        assert_eq!(experience_fit(3.0, &config), 1.0);
        assert_eq!(experience_fit(5.0, &config), 1.0);
        assert_eq!(experience_fit(7.0, &config), 1.0);
        assert_relative_eq!(experience_fit(10.5, &config), 0.5, epsilon = 1e-9);
        assert_eq!(experience_fit(14.0, &config), 0.0);
        assert_eq!(experience_fit(40.0, &config), 0.0);
    }

    #[test]
    fn gap_direction_follows_roles_not_argument_order() {
        let a = mentor();
        let b = mentee();
        let config = ExperienceFitConfig::default();

        let forward = score_pair(&a, &b, &config).experience_fit;
        let reverse = score_pair(&b, &a, &config).experience_fit;
        assert_eq!(forward, reverse);
        assert_eq!(forward, 1.0); // 6-year gap sits inside [3, 7]
    }

    #[test]
    fn interest_overlap_is_case_insensitive_jaccard() {
        let mut a = mentor();
        let mut b = mentee();
        a.interests = vec!["AI Ethics".into(), "Databases".into()];
        b.interests = vec!["ai ethics".into(), "Web".into(), "Cloud".into()];

        let scores = score_pair(&a, &b, &ExperienceFitConfig::default());
        assert_relative_eq!(scores.interest_overlap, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn invalid_experience_config_is_rejected() {
        let config = ExperienceFitConfig {
            ideal_gap_min: 5.0,
            ideal_gap_max: 3.0,
            falloff_years: 7.0,
        };
        assert!(config.validate().is_err());
        assert!(ExperienceFitConfig::default().validate().is_ok());
    }
}
