use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mm_common::embed::EmbeddingProvider;
use mm_common::index::VectorIndex;
use mm_common::store::ProfileStore;
use mm_common::{Preferences, Profile, Role, Skill};

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct RegisterProfile {
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
    pub availability: Vec<String>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub reputation_score: f32,
}

/// Profile view returned by the API. The raw embedding stays server-side.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub skills: Vec<Skill>,
    pub interests: Vec<String>,
    pub experience_years: u32,
    pub bio: String,
    pub availability: Vec<String>,
    pub preferences: Preferences,
    pub reputation_score: f32,
    pub deactivated: bool,
    pub last_active: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            role: profile.role,
            skills: profile.skills,
            interests: profile.interests,
            experience_years: profile.experience_years,
            bio: profile.bio,
            availability: profile.availability,
            preferences: profile.preferences,
            reputation_score: profile.reputation_score,
            deactivated: profile.deactivated,
            last_active: profile.last_active,
        }
    }
}

fn validate(body: &RegisterProfile) -> Result<(), ApiError> {
    if body.id.trim().is_empty() {
        return Err(ApiError::BadRequest("profile id must not be empty".into()));
    }
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("profile name must not be empty".into()));
    }
    if let Some(skill) = body.skills.iter().find(|s| !(1..=5).contains(&s.level)) {
        return Err(ApiError::BadRequest(format!(
            "skill level for '{}' must be within 1..=5",
            skill.name
        )));
    }
    Ok(())
}

/// Register or update a profile. Embeds the text payload, persists the
/// record, then upserts the vector index — index maintenance is this
/// mutating caller's job, the store never auto-propagates.
pub async fn register(
    State(state): State<SharedState>,
    Json(body): Json<RegisterProfile>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    validate(&body)?;

    let now = Utc::now();
    let existing = state.store.get(&body.id).await?;
    let created_at = existing.as_ref().map(|p| p.created_at).unwrap_or(now);
    let status = if existing.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let mut profile = Profile {
        id: body.id,
        name: body.name,
        role: body.role,
        skills: body.skills,
        interests: body.interests,
        experience_years: body.experience_years,
        bio: body.bio,
        embedding: None,
        availability: body.availability,
        preferences: body.preferences,
        reputation_score: body.reputation_score,
        deactivated: false,
        created_at,
        updated_at: now,
        last_active: now,
    };

    let embedding = state.provider.embed(&profile.embedding_text())?;
    profile.embedding = Some(embedding.clone());

    state.store.put(profile.clone()).await?;
    state.index.upsert(&profile.id, embedding)?;

    Ok((status, Json(profile.into())))
}

pub async fn get_profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("profile {id}")))?;
    Ok(Json(profile.into()))
}

/// Deactivate a profile: tombstone in the store, drop from the index. The
/// record is retained for audit.
pub async fn delete_profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id).await?;
    state.index.delete(&id);
    Ok(StatusCode::NO_CONTENT)
}
