use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use mm_common::cancel::CancelToken;
use mm_common::gaps::SkillGap;

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct GapsResponse {
    pub user_id: String,
    pub gaps: Vec<SkillGap>,
}

pub async fn analyze_gaps(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<GapsResponse>, ApiError> {
    let cancel = CancelToken::with_deadline(Duration::from_millis(state.config.request_timeout_ms));
    let gaps = state.analyzer.analyze_gaps(&user_id, &cancel).await?;

    Ok(Json(GapsResponse { user_id, gaps }))
}
