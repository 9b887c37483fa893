use serde::Serialize;
use tracing::info;

/// Event handed to the notification boundary when a caller decides a match
/// is worth surfacing. Delivery mechanics (pub/sub, email, ...) live
/// outside this crate; this fixes only the payload shape.
#[derive(Debug, Clone, Serialize)]
pub struct MatchFoundEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub user_id: String,
    pub candidate_id: String,
    pub blended_score: f64,
}

impl MatchFoundEvent {
    pub fn new(
        user_id: impl Into<String>,
        candidate_id: impl Into<String>,
        blended_score: f64,
    ) -> Self {
        Self {
            kind: "match_found",
            user_id: user_id.into(),
            candidate_id: candidate_id.into(),
            blended_score,
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &MatchFoundEvent);
}

/// Default sink: structured log line, picked up by whatever ships logs.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: &MatchFoundEvent) {
        info!(
            user_id = %event.user_id,
            candidate_id = %event.candidate_id,
            blended_score = event.blended_score,
            "match_found"
        );
    }
}
