use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use mm_common::cancel::CancelToken;
use mm_common::matching::{MatchStatus, ScoreBreakdown};
use mm_common::notify::{MatchFoundEvent, NotificationSink};
use mm_common::store::ProfileStore;
use mm_common::{Role, Skill};

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize, Default)]
pub struct MatchQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

const fn default_limit() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub status: MatchStatus,
    pub matches: Vec<MatchDto>,
}

#[derive(Debug, Serialize)]
pub struct MatchDto {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub skills: Vec<Skill>,
    /// Blended score — the single authoritative compatibility number.
    pub compatibility: f64,
    pub breakdown: ScoreBreakdown,
}

pub async fn find_matches(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<MatchesResponse>, ApiError> {
    let limit = query.limit.clamp(1, 50);
    let cancel = CancelToken::with_deadline(Duration::from_millis(state.config.request_timeout_ms));

    let result = state.engine.find_matches(&user_id, limit, &cancel).await?;

    let mut matches = Vec::with_capacity(result.candidates.len());
    for candidate in &result.candidates {
        // Candidate profiles were present moments ago in the engine; a
        // concurrent tombstone in between just drops the row.
        let Some(profile) = state.store.get(&candidate.candidate_id).await? else {
            continue;
        };

        if candidate.blended_score >= state.config.notify_threshold {
            state.sink.notify(&MatchFoundEvent::new(
                user_id.clone(),
                candidate.candidate_id.clone(),
                candidate.blended_score,
            ));
        }

        matches.push(MatchDto {
            id: profile.id,
            name: profile.name,
            role: profile.role,
            skills: profile.skills,
            compatibility: candidate.blended_score,
            breakdown: candidate.breakdown(),
        });
    }

    Ok(Json(MatchesResponse {
        status: result.status,
        matches,
    }))
}
